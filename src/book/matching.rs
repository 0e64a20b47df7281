//! The matching engine: validation, market sweep, limit cross and rest.
//!
//! Matching is deterministic and pure over `(book state, incoming order,
//! timestamp)`: no retries, no I/O, no clock reads. Every fill and every
//! book mutation stamps the next sequence number; rejects are stamped
//! with the current sequence without consuming one, so a replayed event
//! stream reproduces the live sequence assignment exactly.

use super::book::OrderBook;
use super::error::OrderBookError;
use crate::journal::AuditEvent;
use crate::types::{
    Fill, Liquidity, Order, OrderKind, OrderStatus, Price, RejectReason, Side, TimeInForce,
    TimestampUs,
};
use tracing::trace;

impl OrderBook {
    /// Process one incoming order: validate, match, rest the remainder.
    ///
    /// Rejected orders produce a `Reject` audit event and an empty fill
    /// list; they never mutate the book. The crossed state is transient
    /// within this call only: on return, `best_bid < best_ask` whenever
    /// both exist.
    ///
    /// # Errors
    ///
    /// [`OrderBookError::PoolExhausted`] when the remainder should rest
    /// but the node pool hit its hard cap. Fatal for the actor.
    pub fn process_order(
        &mut self,
        order: Order,
        timestamp: TimestampUs,
    ) -> Result<Vec<Fill>, OrderBookError> {
        if let Some(reason) = self.validate(&order) {
            self.reject_incoming(&order, reason, timestamp);
            return Ok(Vec::new());
        }

        let mut order = order;
        order.arrival_timestamp = timestamp;
        order.leaves_quantity = order.original_quantity;
        order.status = OrderStatus::Active;

        if order.is_post_only() && self.would_take(&order) {
            self.reject_incoming(&order, RejectReason::PostOnlyWouldTake, timestamp);
            return Ok(Vec::new());
        }

        if order.time_in_force == TimeInForce::Fok && !self.fok_fillable(&order) {
            self.reject_incoming(&order, RejectReason::FokUnfillable, timestamp);
            return Ok(Vec::new());
        }

        trace!(
            order_id = order.order_id,
            side = %order.side,
            price = order.price,
            quantity = order.original_quantity,
            "processing order"
        );

        // Only accepted orders advance book state; rejected submissions
        // leave nothing behind for replay to re-derive.
        self.last_timestamp = timestamp;
        let sequence = self.next_sequence();
        self.emit(
            sequence,
            AuditEvent::Add {
                timestamp,
                order_id: order.order_id,
                price: order.price,
                quantity: order.original_quantity,
                packed_attributes: order.packed_attributes(),
            },
        );

        let mut fills = Vec::new();
        self.match_incoming(&mut order, timestamp, &mut fills);

        if order.leaves_quantity > 0 {
            let rests =
                order.kind == OrderKind::Limit && order.time_in_force != TimeInForce::Ioc;
            if rests {
                let resting = self.insert_resting(order)?;
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_order_added(&resting);
                }
            } else {
                // Market and IOC remainders are discarded, never rested.
                order.status = if fills.is_empty() {
                    OrderStatus::Canceled
                } else {
                    OrderStatus::PartiallyFilled
                };
            }
        }

        self.check_bbo_change(timestamp);
        self.debug_assert_uncrossed();
        Ok(fills)
    }

    /// Match `order` against the opposite ladder in strict price-time
    /// priority, consuming levels best-price-first and nodes
    /// front-to-back. Emptied levels are removed before the next
    /// iteration.
    pub(super) fn match_incoming(
        &mut self,
        order: &mut Order,
        timestamp: TimestampUs,
        fills: &mut Vec<Fill>,
    ) {
        let opposite = order.side.opposite();

        while order.leaves_quantity > 0 {
            let Some(level_idx) = self.ladder(opposite).best_idx() else {
                break;
            };
            let level_price = self.ladder(opposite).get(level_idx).price();
            if order.kind == OrderKind::Limit
                && !Self::crosses(order.side, order.price, level_price)
            {
                break;
            }

            while order.leaves_quantity > 0 {
                let Some(front_idx) = self.ladder(opposite).get(level_idx).peek_front() else {
                    break;
                };
                let passive = self.pool.get(front_idx).order;
                let fill_quantity = order.leaves_quantity.min(passive.leaves_quantity);
                let sequence = self.next_sequence();

                let fill = Fill {
                    fill_id: sequence,
                    aggressor_order_id: order.order_id,
                    passive_order_id: passive.order_id,
                    instrument_id: self.instrument_id(),
                    price: level_price,
                    quantity: fill_quantity,
                    side: order.side,
                    is_hidden: passive.is_hidden(),
                    liquidity: Liquidity::Taker,
                    timestamp,
                    sequence_number: sequence,
                };

                let passive_leaves = passive.leaves_quantity - fill_quantity;
                {
                    let ladder = match opposite {
                        Side::Buy => &mut self.bids,
                        Side::Sell => &mut self.asks,
                    };
                    let level = ladder.get_mut(level_idx);
                    if passive_leaves == 0 {
                        level.remove(front_idx, &mut self.pool);
                    } else {
                        // Partial fill: the node keeps the head of the
                        // queue, its position unchanged.
                        level.reduce_quantity(front_idx, &mut self.pool, passive_leaves);
                        self.pool.get_mut(front_idx).order.status =
                            OrderStatus::PartiallyFilled;
                    }
                }
                if passive_leaves == 0 {
                    self.orders.remove(&passive.order_id);
                    self.pool.get_mut(front_idx).order.status = OrderStatus::Filled;
                    self.pool.release(front_idx);
                }

                order.leaves_quantity -= fill_quantity;
                order.status = if order.leaves_quantity == 0 {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                };

                self.record_trade_price(level_price);
                self.emit(
                    sequence,
                    AuditEvent::Fill {
                        timestamp,
                        price: level_price,
                        quantity: fill_quantity,
                        buy_order_id: fill.buy_order_id(),
                        sell_order_id: fill.sell_order_id(),
                    },
                );
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_trade(&fill);
                }
                fills.push(fill);
            }

            if self.ladder(opposite).get(level_idx).is_empty() {
                let ladder = match opposite {
                    Side::Buy => &mut self.bids,
                    Side::Sell => &mut self.asks,
                };
                ladder.remove_level(level_idx);
            }
        }
    }

    /// Reject conditions, checked in order. `None` means the order is
    /// acceptable.
    fn validate(&self, order: &Order) -> Option<RejectReason> {
        if order.order_id == 0 {
            return Some(RejectReason::BadOrderId);
        }
        if order.price < 0 {
            return Some(RejectReason::BadPrice);
        }
        if order.original_quantity == 0 {
            return Some(RejectReason::BadQuantity);
        }
        if self.orders.contains_key(&order.order_id) {
            return Some(RejectReason::DuplicateOrderId);
        }
        None
    }

    /// Emit a `Reject` event without mutating the book. Rejects are
    /// stamped with the current sequence and do not consume one.
    pub(super) fn reject_incoming(
        &mut self,
        order: &Order,
        reason: RejectReason,
        timestamp: TimestampUs,
    ) {
        trace!(order_id = order.order_id, %reason, "order rejected");
        self.emit(
            self.current_sequence(),
            AuditEvent::Reject {
                timestamp,
                order_id: order.order_id,
                reason,
                quantity: order.original_quantity,
                price: order.price,
            },
        );
        let mut rejected = *order;
        rejected.status = OrderStatus::Rejected;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_order_rejected(&rejected, reason);
        }
    }

    /// Whether the order would execute immediately against the opposite
    /// side. Market orders always take.
    fn would_take(&self, order: &Order) -> bool {
        if order.kind == OrderKind::Market {
            return true;
        }
        match self.ladder(order.side.opposite()).best() {
            Some(level) => Self::crosses(order.side, order.price, level.price()),
            None => false,
        }
    }

    /// Whether enough opposite liquidity exists within the order's limit
    /// to fill it entirely. Hidden quantity counts: it participates in
    /// matching.
    fn fok_fillable(&self, order: &Order) -> bool {
        let needed = u64::from(order.original_quantity);
        let ladder = self.ladder(order.side.opposite());
        let mut available = 0u64;
        for idx in ladder.iter_indices() {
            let level = ladder.get(idx);
            if order.kind == OrderKind::Limit
                && !Self::crosses(order.side, order.price, level.price())
            {
                break;
            }
            available += level.total_quantity();
            if available >= needed {
                return true;
            }
        }
        false
    }

    /// Whether a limit order at `limit` crosses a level at `level_price`.
    #[inline]
    fn crosses(side: Side, limit: Price, level_price: Price) -> bool {
        match side {
            Side::Buy => limit >= level_price,
            Side::Sell => limit <= level_price,
        }
    }
}
