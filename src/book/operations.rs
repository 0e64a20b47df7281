//! Public book operations: submit, cancel and amend.

use super::book::{AmendPolicy, OrderBook};
use super::error::OrderBookError;
use crate::journal::AuditEvent;
use crate::types::{
    Fill, Order, OrderId, OrderStatus, Price, Qty, RejectReason, Side, TimestampUs,
};
use tracing::trace;

/// The result of an amend request.
#[derive(Debug, Clone, PartialEq)]
pub enum AmendOutcome {
    /// Size-down applied in place; queue position preserved.
    InPlace(Order),
    /// Size-up: the order was canceled and resubmitted at the back of the
    /// queue with the new quantity.
    Resubmitted {
        /// The order after resubmission (resting remainder or fully
        /// matched).
        order: Order,
        /// Fills produced by the resubmission, if it crossed.
        fills: Vec<Fill>,
    },
    /// The amend requested quantity zero and was treated as a cancel.
    Canceled(Order),
    /// Refused under [`AmendPolicy::RejectSizeUp`].
    Rejected(RejectReason),
    /// No resting order with that id.
    NotFound,
}

impl OrderBook {
    /// Submit an order. Alias of [`OrderBook::process_order`], matching
    /// the engine API surface.
    ///
    /// # Errors
    ///
    /// [`OrderBookError::PoolExhausted`] when the remainder should rest
    /// but the node pool hit its hard cap.
    pub fn submit(
        &mut self,
        order: Order,
        timestamp: TimestampUs,
    ) -> Result<Vec<Fill>, OrderBookError> {
        self.process_order(order, timestamp)
    }

    /// Submit a plain limit order.
    ///
    /// # Errors
    ///
    /// See [`OrderBook::submit`].
    pub fn submit_limit(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Qty,
        timestamp: TimestampUs,
    ) -> Result<Vec<Fill>, OrderBookError> {
        trace!(order_id, %side, price, quantity, "submitting limit order");
        let order = Order::limit(order_id, self.instrument_id(), side, price, quantity);
        self.process_order(order, timestamp)
    }

    /// Submit a market order.
    ///
    /// # Errors
    ///
    /// See [`OrderBook::submit`].
    pub fn submit_market(
        &mut self,
        order_id: OrderId,
        side: Side,
        quantity: Qty,
        timestamp: TimestampUs,
    ) -> Result<Vec<Fill>, OrderBookError> {
        trace!(order_id, %side, quantity, "submitting market order");
        let order = Order::market(order_id, self.instrument_id(), side, quantity);
        self.process_order(order, timestamp)
    }

    /// Cancel a resting order.
    ///
    /// Removes the node from its level, updates the aggregates, removes
    /// the level if it emptied, and emits a `Cancel` audit event carrying
    /// the leaves at the time of cancel. Returns `None` for unknown ids
    /// without emitting anything.
    pub fn cancel(&mut self, order_id: OrderId, timestamp: TimestampUs) -> Option<Order> {
        let node_idx = self.orders.remove(&order_id)?;
        self.last_timestamp = timestamp;

        let mut order = self.pool.get(node_idx).order;
        let level_idx = self.pool.get(node_idx).level;
        {
            let ladder = match order.side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let level = ladder.get_mut(level_idx);
            level.remove(node_idx, &mut self.pool);
            if level.is_empty() {
                ladder.remove_level(level_idx);
            }
        }
        self.pool.release(node_idx);
        order.status = OrderStatus::Canceled;

        trace!(order_id, leaves = order.leaves_quantity, "order canceled");
        let sequence = self.next_sequence();
        self.emit(
            sequence,
            AuditEvent::Cancel {
                timestamp,
                order_id,
                leaves_quantity: order.leaves_quantity,
                original_quantity: order.original_quantity,
            },
        );
        if let Some(listener) = self.listener.as_mut() {
            listener.on_order_canceled(&order);
        }
        self.check_bbo_change(timestamp);
        Some(order)
    }

    /// Amend a resting order's quantity.
    ///
    /// Zero is treated as a cancel. A size-down within the original
    /// quantity and current leaves updates in place and preserves queue
    /// position. A size-up cancels and resubmits at the back of the queue
    /// (or is refused under [`AmendPolicy::RejectSizeUp`]); increasing
    /// size never keeps queue priority.
    ///
    /// # Errors
    ///
    /// [`OrderBookError::PoolExhausted`] when a resubmission cannot
    /// allocate a node.
    pub fn amend(
        &mut self,
        order_id: OrderId,
        new_quantity: Qty,
        timestamp: TimestampUs,
    ) -> Result<AmendOutcome, OrderBookError> {
        let Some(&node_idx) = self.orders.get(&order_id) else {
            return Ok(AmendOutcome::NotFound);
        };
        let order = self.pool.get(node_idx).order;

        if new_quantity == 0 {
            let canceled = self.cancel(order_id, timestamp).unwrap_or(order);
            return Ok(AmendOutcome::Canceled(canceled));
        }

        let old_leaves = order.leaves_quantity;

        if new_quantity <= order.original_quantity && new_quantity <= old_leaves {
            self.last_timestamp = timestamp;
            let level_idx = self.pool.get(node_idx).level;
            {
                let ladder = match order.side {
                    Side::Buy => &mut self.bids,
                    Side::Sell => &mut self.asks,
                };
                ladder
                    .get_mut(level_idx)
                    .reduce_quantity(node_idx, &mut self.pool, new_quantity);
            }
            trace!(order_id, old_leaves, new_quantity, "order amended in place");
            let sequence = self.next_sequence();
            self.emit(
                sequence,
                AuditEvent::Amend {
                    timestamp,
                    order_id,
                    new_quantity,
                    old_quantity: old_leaves,
                    new_price: order.price,
                    old_price: order.price,
                },
            );
            let updated = self.pool.get(node_idx).order;
            if let Some(listener) = self.listener.as_mut() {
                listener.on_order_amended(&updated);
            }
            self.check_bbo_change(timestamp);
            return Ok(AmendOutcome::InPlace(updated));
        }

        match self.amend_policy() {
            AmendPolicy::RejectSizeUp => {
                trace!(order_id, new_quantity, "size-up amend rejected");
                self.emit(
                    self.current_sequence(),
                    AuditEvent::Reject {
                        timestamp,
                        order_id,
                        reason: RejectReason::AmendSizeUp,
                        quantity: new_quantity,
                        price: order.price,
                    },
                );
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_order_rejected(&order, RejectReason::AmendSizeUp);
                }
                Ok(AmendOutcome::Rejected(RejectReason::AmendSizeUp))
            }
            AmendPolicy::CancelResubmit => {
                // Silent removal: the single Amend event below stands for
                // the whole cancel-and-resubmit, so replay re-applies it
                // as one operation.
                self.last_timestamp = timestamp;
                let level_idx = self.pool.get(node_idx).level;
                {
                    let ladder = match order.side {
                        Side::Buy => &mut self.bids,
                        Side::Sell => &mut self.asks,
                    };
                    let level = ladder.get_mut(level_idx);
                    level.remove(node_idx, &mut self.pool);
                    if level.is_empty() {
                        ladder.remove_level(level_idx);
                    }
                }
                self.orders.remove(&order_id);
                self.pool.release(node_idx);

                trace!(order_id, old_leaves, new_quantity, "order amended by resubmission");
                let sequence = self.next_sequence();
                self.emit(
                    sequence,
                    AuditEvent::Amend {
                        timestamp,
                        order_id,
                        new_quantity,
                        old_quantity: old_leaves,
                        new_price: order.price,
                        old_price: order.price,
                    },
                );

                let mut fresh = order;
                fresh.original_quantity = new_quantity;
                fresh.leaves_quantity = new_quantity;
                fresh.arrival_timestamp = timestamp;
                fresh.status = OrderStatus::Active;
                fresh.queue_position = 0;

                let mut fills = Vec::new();
                self.match_incoming(&mut fresh, timestamp, &mut fills);
                let result_order = if fresh.leaves_quantity > 0 {
                    self.insert_resting(fresh)?
                } else {
                    fresh
                };
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_order_amended(&result_order);
                }
                self.check_bbo_change(timestamp);
                self.debug_assert_uncrossed();
                Ok(AmendOutcome::Resubmitted {
                    order: result_order,
                    fills,
                })
            }
        }
    }
}
