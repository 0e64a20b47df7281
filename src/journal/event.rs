//! Audit events recorded by the journal.
//!
//! Every book-mutating or fill-emitting operation produces one or more of
//! these events. Events are write-once: the journal appends them and the
//! replay session consumes them; nothing rewrites an event in place.

use crate::types::{OrderId, Price, Qty, RejectReason, TimestampUs};
use serde::{Deserialize, Serialize};

/// Event type discriminator, stored in the low 5 bits of the record's
/// leading flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    /// An order was accepted for processing.
    Add = 1,
    /// A resting order was removed on request.
    Cancel = 2,
    /// A resting order's quantity was amended.
    Amend = 3,
    /// One execution between an aggressor and a resting order.
    Fill = 4,
    /// An aggregate trade print. Wire-compatible with `Fill`.
    Trade = 5,
    /// An order failed validation or matching policy.
    Reject = 6,
    /// The top of either ladder changed.
    BboChange = 7,
}

impl EventType {
    /// Decode the low-5-bit type code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EventType::Add),
            2 => Some(EventType::Cancel),
            3 => Some(EventType::Amend),
            4 => Some(EventType::Fill),
            5 => Some(EventType::Trade),
            6 => Some(EventType::Reject),
            7 => Some(EventType::BboChange),
            _ => None,
        }
    }
}

/// One record in the audit journal.
///
/// The wire layout of every variant is fixed by its event type; see the
/// codec module for sizes. Prices of an absent BBO side are encoded as
/// zero with zero size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    /// An order entered processing. Replay re-drives the engine from these.
    Add {
        /// Time of the `process_order` call.
        timestamp: TimestampUs,
        /// The incoming order's id.
        order_id: OrderId,
        /// Limit price (0 for market orders).
        price: Price,
        /// Original quantity.
        quantity: Qty,
        /// Side, kind, time-in-force and flags packed per
        /// [`crate::types::Order::packed_attributes`].
        packed_attributes: u16,
    },

    /// A resting order was canceled.
    Cancel {
        /// Time of the cancel.
        timestamp: TimestampUs,
        /// The canceled order's id.
        order_id: OrderId,
        /// Unfilled quantity at the time of cancel.
        leaves_quantity: Qty,
        /// Quantity at submission.
        original_quantity: Qty,
    },

    /// A resting order's quantity was amended.
    Amend {
        /// Time of the amend.
        timestamp: TimestampUs,
        /// The amended order's id.
        order_id: OrderId,
        /// Requested quantity.
        new_quantity: Qty,
        /// Leaves quantity before the amend.
        old_quantity: Qty,
        /// Price after the amend (quantity amends keep it unchanged).
        new_price: Price,
        /// Price before the amend.
        old_price: Price,
    },

    /// One execution.
    Fill {
        /// Time of the `process_order` call that matched.
        timestamp: TimestampUs,
        /// Execution price.
        price: Price,
        /// Executed quantity.
        quantity: Qty,
        /// Order id on the buy side.
        buy_order_id: OrderId,
        /// Order id on the sell side.
        sell_order_id: OrderId,
    },

    /// An aggregate trade print; same payload as `Fill`.
    Trade {
        /// Print time.
        timestamp: TimestampUs,
        /// Trade price.
        price: Price,
        /// Traded quantity.
        quantity: Qty,
        /// Order id on the buy side.
        buy_order_id: OrderId,
        /// Order id on the sell side.
        sell_order_id: OrderId,
    },

    /// An order was refused.
    Reject {
        /// Time of the refusal.
        timestamp: TimestampUs,
        /// The refused order's id.
        order_id: OrderId,
        /// Why it was refused.
        reason: RejectReason,
        /// The refused quantity.
        quantity: Qty,
        /// The refused price.
        price: Price,
    },

    /// The top of either side changed (including becoming empty).
    BboChange {
        /// Time of the change.
        timestamp: TimestampUs,
        /// Best bid price, 0 when the bid side is empty.
        bid_price: Price,
        /// Visible quantity at the best bid, 0 when empty.
        bid_quantity: Qty,
        /// Best ask price, 0 when the ask side is empty.
        ask_price: Price,
        /// Visible quantity at the best ask, 0 when empty.
        ask_quantity: Qty,
    },
}

impl AuditEvent {
    /// The wire type of this event.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            AuditEvent::Add { .. } => EventType::Add,
            AuditEvent::Cancel { .. } => EventType::Cancel,
            AuditEvent::Amend { .. } => EventType::Amend,
            AuditEvent::Fill { .. } => EventType::Fill,
            AuditEvent::Trade { .. } => EventType::Trade,
            AuditEvent::Reject { .. } => EventType::Reject,
            AuditEvent::BboChange { .. } => EventType::BboChange,
        }
    }

    /// The event's timestamp in microseconds since the session epoch.
    #[must_use]
    pub fn timestamp(&self) -> TimestampUs {
        match self {
            AuditEvent::Add { timestamp, .. }
            | AuditEvent::Cancel { timestamp, .. }
            | AuditEvent::Amend { timestamp, .. }
            | AuditEvent::Fill { timestamp, .. }
            | AuditEvent::Trade { timestamp, .. }
            | AuditEvent::Reject { timestamp, .. }
            | AuditEvent::BboChange { timestamp, .. } => *timestamp,
        }
    }
}
