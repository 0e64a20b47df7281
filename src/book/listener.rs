//! Listener capability set.
//!
//! Consumers observe the book by supplying a value carrying these
//! callbacks. All callbacks run synchronously inside the matching actor
//! and must not re-enter the engine.

use crate::types::{Bbo, Fill, Order, RejectReason};

/// Callbacks invoked by the book as it processes orders.
///
/// Every method has a no-op default, so implementers override only what
/// they consume.
pub trait BookListener {
    /// A fill was produced.
    fn on_trade(&mut self, fill: &Fill) {
        let _ = fill;
    }

    /// An order remainder was accepted into the book.
    fn on_order_added(&mut self, order: &Order) {
        let _ = order;
    }

    /// A resting order was canceled.
    fn on_order_canceled(&mut self, order: &Order) {
        let _ = order;
    }

    /// A resting order was amended in place or resubmitted.
    fn on_order_amended(&mut self, order: &Order) {
        let _ = order;
    }

    /// An order was refused.
    fn on_order_rejected(&mut self, order: &Order, reason: RejectReason) {
        let _ = (order, reason);
    }

    /// The top of either side changed.
    fn on_bbo_changed(&mut self, bbo: &Bbo) {
        let _ = bbo;
    }
}

/// A listener that records nothing. Useful as a default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl BookListener for NullListener {}
