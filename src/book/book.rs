//! Core order book state: two ladders, the order index and the node pool.
//!
//! The book is the sole mutator of its ladders and index; it runs as a
//! single-threaded serial actor, one per instrument. External observers
//! only ever receive immutable snapshot values.

use super::error::OrderBookError;
use super::ladder::Ladder;
use super::level::OrderBookEntry;
use super::listener::BookListener;
use super::pool::NodePool;
use crate::journal::{AuditEvent, clamp_wire_qty};
use crate::types::{
    Bbo, InstrumentId, Order, OrderId, Price, Qty, Quote, SeqNum, Side, TimestampUs,
};
use crossbeam::utils::CachePadded;
use std::collections::HashMap;

/// How the book handles an amend that increases quantity beyond the
/// current leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmendPolicy {
    /// Cancel the resting order and resubmit it with the new quantity at
    /// the back of the queue. The industry norm: size-ups never keep queue
    /// priority.
    #[default]
    CancelResubmit,
    /// Refuse size-up amends outright.
    RejectSizeUp,
}

/// A price-time-priority limit order book with per-order queue tracking.
///
/// The single public mutation entry points are
/// [`process_order`](OrderBook::process_order),
/// [`cancel`](OrderBook::cancel) and [`amend`](OrderBook::amend); every
/// mutation stamps a strictly monotone sequence number on the audit
/// events it produces, which the owning session drains via
/// [`drain_events`](OrderBook::drain_events).
pub struct OrderBook {
    instrument_id: InstrumentId,
    pub(super) bids: Ladder,
    pub(super) asks: Ladder,
    pub(super) orders: HashMap<OrderId, usize>,
    pub(super) pool: NodePool,
    /// Hot counter, padded so it never shares a line with cold metadata.
    sequence: CachePadded<SeqNum>,
    last_bbo: Bbo,
    last_trade_price: Option<Price>,
    pub(super) last_timestamp: TimestampUs,
    pending: Vec<(SeqNum, AuditEvent)>,
    pub(super) listener: Option<Box<dyn BookListener>>,
    amend_policy: AmendPolicy,
}

impl OrderBook {
    /// An empty book for one instrument.
    #[must_use]
    pub fn new(instrument_id: InstrumentId) -> Self {
        Self {
            instrument_id,
            bids: Ladder::new(Side::Buy),
            asks: Ladder::new(Side::Sell),
            orders: HashMap::new(),
            pool: NodePool::new(),
            sequence: CachePadded::new(0),
            last_bbo: Bbo::default(),
            last_trade_price: None,
            last_timestamp: 0,
            pending: Vec::new(),
            listener: None,
            amend_policy: AmendPolicy::default(),
        }
    }

    /// Attach a listener invoked synchronously for every book event.
    #[must_use]
    pub fn with_listener(mut self, listener: Box<dyn BookListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Replace the listener on an existing book.
    pub fn set_listener(&mut self, listener: Option<Box<dyn BookListener>>) {
        self.listener = listener;
    }

    /// Select the amend size-up policy.
    #[must_use]
    pub fn with_amend_policy(mut self, policy: AmendPolicy) -> Self {
        self.amend_policy = policy;
        self
    }

    /// Cap the node pool. Past the cap, submissions that would rest fail
    /// with [`OrderBookError::PoolExhausted`].
    #[must_use]
    pub fn with_max_pool_nodes(mut self, max_nodes: usize) -> Self {
        self.pool = NodePool::new().with_max_nodes(max_nodes);
        self
    }

    /// The instrument this book trades.
    #[inline]
    #[must_use]
    pub fn instrument_id(&self) -> InstrumentId {
        self.instrument_id
    }

    /// The configured amend policy.
    #[inline]
    #[must_use]
    pub fn amend_policy(&self) -> AmendPolicy {
        self.amend_policy
    }

    /// The sequence of the most recent event.
    #[inline]
    #[must_use]
    pub fn current_sequence(&self) -> SeqNum {
        *self.sequence
    }

    /// Price of the last execution, if any.
    #[inline]
    #[must_use]
    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    /// Number of orders resting in the book.
    #[must_use]
    pub fn open_order_count(&self) -> usize {
        self.orders.len()
    }

    /// Best bid and ask with their visible sizes, when both sides exist.
    #[must_use]
    pub fn best_bid_ask(&self) -> Option<(Price, Qty, Price, Qty)> {
        let bid = self.bids.best()?;
        let ask = self.asks.best()?;
        Some((
            bid.price(),
            clamp_wire_qty(bid.visible_quantity()),
            ask.price(),
            clamp_wire_qty(ask.visible_quantity()),
        ))
    }

    /// Current top of both sides, sides independently optional.
    #[must_use]
    pub fn bbo(&self) -> Bbo {
        Bbo {
            bid: self.bids.best().map(|level| Quote {
                price: level.price(),
                quantity: clamp_wire_qty(level.visible_quantity()),
            }),
            ask: self.asks.best().map(|level| Quote {
                price: level.price(),
                quantity: clamp_wire_qty(level.visible_quantity()),
            }),
            sequence: *self.sequence,
        }
    }

    /// L2 view of the top `depth` levels on one side, best first.
    #[must_use]
    pub fn depth(&self, side: Side, depth: usize) -> Vec<OrderBookEntry> {
        let ladder = self.ladder(side);
        ladder
            .iter_indices()
            .take(depth)
            .map(|idx| ladder.get(idx).entry(*self.sequence))
            .collect()
    }

    /// A copy of a resting order.
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.orders
            .get(&order_id)
            .map(|&idx| self.pool.get(idx).order)
    }

    /// Live 1-based queue position of a resting order, recomputed by
    /// walking from the node to the head of its level. O(position).
    #[must_use]
    pub fn queue_position(&self, order_id: OrderId) -> Option<u32> {
        let &node_idx = self.orders.get(&order_id)?;
        let mut position = 1u32;
        let mut cursor = self.pool.get(node_idx).prev;
        while let Some(idx) = cursor {
            position += 1;
            cursor = self.pool.get(idx).prev;
        }
        Some(position)
    }

    /// Sum of `leaves_quantity` over the orders queued ahead of
    /// `order_id` in its level.
    #[must_use]
    pub fn quantity_ahead(&self, order_id: OrderId) -> Option<u64> {
        let &node_idx = self.orders.get(&order_id)?;
        let mut ahead = 0u64;
        let mut cursor = self.pool.get(node_idx).prev;
        while let Some(idx) = cursor {
            ahead += u64::from(self.pool.get(idx).order.leaves_quantity);
            cursor = self.pool.get(idx).prev;
        }
        Some(ahead)
    }

    /// Orders at one price, head to tail. Empty when no such level exists.
    #[must_use]
    pub fn level_orders(&self, side: Side, price: Price) -> Vec<Order> {
        let ladder = self.ladder(side);
        let Some(level_idx) = ladder.level_at(price) else {
            return Vec::new();
        };
        let level = ladder.get(level_idx);
        let mut orders = Vec::with_capacity(level.len() as usize);
        let mut cursor = level.peek_front();
        while let Some(idx) = cursor {
            orders.push(self.pool.get(idx).order);
            cursor = self.pool.get(idx).next;
        }
        orders
    }

    /// Mutation counter of the level at `price`. Observers poll it to
    /// detect change without diffing the queue. `None` when no such level
    /// exists.
    #[must_use]
    pub fn level_version(&self, side: Side, price: Price) -> Option<u64> {
        let ladder = self.ladder(side);
        ladder
            .level_at(price)
            .map(|idx| ladder.get(idx).version())
    }

    /// Number of price levels on one side.
    #[must_use]
    pub fn level_count(&self, side: Side) -> usize {
        self.ladder(side).level_count()
    }

    /// Drain the audit events accumulated since the last drain, paired
    /// with their sequence numbers in emission order.
    ///
    /// A book used without a session accumulates events until drained.
    pub fn drain_events(&mut self) -> Vec<(SeqNum, AuditEvent)> {
        std::mem::take(&mut self.pending)
    }

    // ─── internals shared by matching and operations ───

    #[inline]
    pub(super) fn ladder(&self, side: Side) -> &Ladder {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub(super) fn next_sequence(&mut self) -> SeqNum {
        *self.sequence += 1;
        *self.sequence
    }

    pub(super) fn emit(&mut self, sequence: SeqNum, event: AuditEvent) {
        self.pending.push((sequence, event));
    }

    pub(super) fn record_trade_price(&mut self, price: Price) {
        self.last_trade_price = Some(price);
    }

    /// Insert an order remainder into its own ladder. The order must
    /// already carry its arrival timestamp and status.
    pub(super) fn insert_resting(&mut self, order: Order) -> Result<Order, OrderBookError> {
        let node_idx = self.pool.alloc(order)?;
        let ladder = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level_idx = ladder.ensure(order.price);
        self.pool.get_mut(node_idx).level = level_idx;
        ladder.get_mut(level_idx).insert(node_idx, &mut self.pool);
        self.orders.insert(order.order_id, node_idx);
        Ok(self.pool.get(node_idx).order)
    }

    /// Emit a `BboChange` event if the top of either side moved since the
    /// last check.
    pub(super) fn check_bbo_change(&mut self, timestamp: TimestampUs) {
        let current = self.bbo();
        if !current.top_differs(&self.last_bbo) {
            return;
        }
        let sequence = self.next_sequence();
        let bbo = Bbo {
            sequence,
            ..current
        };
        let event = AuditEvent::BboChange {
            timestamp,
            bid_price: bbo.bid.map_or(0, |q| q.price),
            bid_quantity: bbo.bid.map_or(0, |q| q.quantity),
            ask_price: bbo.ask.map_or(0, |q| q.price),
            ask_quantity: bbo.ask.map_or(0, |q| q.quantity),
        };
        self.emit(sequence, event);
        self.last_bbo = bbo;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_bbo_changed(&bbo);
        }
    }

    #[cfg(debug_assertions)]
    pub(super) fn debug_assert_uncrossed(&self) {
        if let (Some(bid), Some(ask)) = (self.bids.best(), self.asks.best()) {
            debug_assert!(
                bid.price() < ask.price(),
                "book crossed after processing: bid {} >= ask {}",
                bid.price(),
                ask.price()
            );
        }
    }

    #[cfg(not(debug_assertions))]
    pub(super) fn debug_assert_uncrossed(&self) {}
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("instrument_id", &self.instrument_id)
            .field("bid_levels", &self.bids.level_count())
            .field("ask_levels", &self.asks.level_count())
            .field("open_orders", &self.orders.len())
            .field("sequence", &*self.sequence)
            .finish()
    }
}
