//! The order record and its attribute enums.
//!
//! `Order` is a fixed-layout, `Copy` value. Once an order is accepted into
//! the book only `leaves_quantity`, `status` and `queue_position` may
//! change; `price`, `side`, `kind` and `original_quantity` are immutable.

use super::side::Side;
use super::{InstrumentId, OrderId, Price, Qty, TimestampUs};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the order carries a limit price or sweeps the opposite side
/// unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Rests at `price` after matching whatever crosses.
    Limit,
    /// Matches against the opposite best side until filled or the book is
    /// exhausted; any remainder is discarded. Market orders never rest.
    Market,
}

impl OrderKind {
    #[inline]
    fn wire_code(self) -> u16 {
        match self {
            OrderKind::Limit => 0,
            OrderKind::Market => 1,
        }
    }

    #[inline]
    fn from_wire_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(OrderKind::Limit),
            1 => Some(OrderKind::Market),
            _ => None,
        }
    }
}

/// Time-in-force policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Valid for the trading day.
    Day,
    /// Immediate-or-cancel: match what is possible, discard the remainder.
    Ioc,
    /// Fill-or-kill: fill the entire quantity immediately or reject without
    /// touching the book.
    Fok,
    /// Good-till-cancel.
    Gtc,
}

impl TimeInForce {
    #[inline]
    fn wire_code(self) -> u16 {
        match self {
            TimeInForce::Day => 0,
            TimeInForce::Ioc => 1,
            TimeInForce::Fok => 2,
            TimeInForce::Gtc => 3,
        }
    }

    #[inline]
    fn from_wire_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(TimeInForce::Day),
            1 => Some(TimeInForce::Ioc),
            2 => Some(TimeInForce::Fok),
            3 => Some(TimeInForce::Gtc),
            _ => None,
        }
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Day => write!(f, "DAY"),
            TimeInForce::Ioc => write!(f, "IOC"),
            TimeInForce::Fok => write!(f, "FOK"),
            TimeInForce::Gtc => write!(f, "GTC"),
        }
    }
}

/// Lifecycle state of an order.
///
/// `Filled`, `Canceled` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, no fills yet.
    Active,
    /// At least one fill, `leaves_quantity > 0`.
    PartiallyFilled,
    /// `leaves_quantity` reached zero.
    Filled,
    /// Removed by a cancel request (or an expired remainder).
    Canceled,
    /// Failed validation; never entered the book.
    Rejected,
}

impl OrderStatus {
    /// True for states from which no further transition is possible.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }
}

bitflags! {
    /// Behavioral order flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct OrderFlags: u8 {
        /// Participates in matching in normal FIFO order but contributes
        /// nothing to visible aggregates or L2 views.
        const HIDDEN = 0b001;
        /// Forbidden from taking liquidity; rejected if it would cross.
        const POST_ONLY = 0b010;
        /// Only reduces an existing position. Carried and journaled; not
        /// enforced here (enforcement needs position state, which lives in
        /// the external risk gate).
        const REDUCE_ONLY = 0b100;
    }
}

/// Error decoding the packed side/kind/tif/flags wire word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedOrderError(pub u16);

impl fmt::Display for PackedOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid packed order attributes: {:#06x}", self.0)
    }
}

impl std::error::Error for PackedOrderError {}

/// A fixed-size order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C, align(8))]
pub struct Order {
    /// Unique, monotonically assigned by the issuer. Zero is invalid.
    pub order_id: OrderId,
    /// The instrument this order trades.
    pub instrument_id: InstrumentId,
    /// Limit price in ticks. Ignored for market orders (conventionally 0).
    pub price: Price,
    /// Assignment time, monotone within a session. Stamped by the engine
    /// at `process_order` time.
    pub arrival_timestamp: TimestampUs,
    /// Quantity at submission. Immutable.
    pub original_quantity: Qty,
    /// Unfilled quantity, always within `[0, original_quantity]`.
    pub leaves_quantity: Qty,
    /// Displayed quantity for iceberg orders carrying [`OrderFlags::HIDDEN`].
    /// Zero means the full size is displayed (non-iceberg).
    pub display_quantity: Qty,
    /// 1-based rank within the price level queue at insertion time. Not
    /// renumbered when earlier nodes leave; live positions are recomputed
    /// by walking the queue.
    pub queue_position: u32,
    /// Buy or sell.
    pub side: Side,
    /// Limit or market.
    pub kind: OrderKind,
    /// Time-in-force policy.
    pub time_in_force: TimeInForce,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Behavioral flags.
    pub flags: OrderFlags,
}

impl Order {
    /// Create a limit order with `Gtc` time-in-force and no flags.
    #[must_use]
    pub fn limit(
        order_id: OrderId,
        instrument_id: InstrumentId,
        side: Side,
        price: Price,
        quantity: Qty,
    ) -> Self {
        Self {
            order_id,
            instrument_id,
            price,
            arrival_timestamp: 0,
            original_quantity: quantity,
            leaves_quantity: quantity,
            display_quantity: 0,
            queue_position: 0,
            side,
            kind: OrderKind::Limit,
            time_in_force: TimeInForce::Gtc,
            status: OrderStatus::Active,
            flags: OrderFlags::empty(),
        }
    }

    /// Create a market order. The price field is zero and ignored.
    #[must_use]
    pub fn market(
        order_id: OrderId,
        instrument_id: InstrumentId,
        side: Side,
        quantity: Qty,
    ) -> Self {
        Self {
            price: 0,
            kind: OrderKind::Market,
            ..Self::limit(order_id, instrument_id, side, 0, quantity)
        }
    }

    /// Replace the flag set.
    #[must_use]
    pub fn with_flags(mut self, flags: OrderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Replace the time-in-force.
    #[must_use]
    pub fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Mark the order hidden with an iceberg display quantity.
    #[must_use]
    pub fn with_display_quantity(mut self, display: Qty) -> Self {
        self.flags |= OrderFlags::HIDDEN;
        self.display_quantity = display;
        self
    }

    /// Whether the order is excluded from visible aggregates.
    #[inline]
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(OrderFlags::HIDDEN)
    }

    /// Whether the order is forbidden from taking liquidity.
    #[inline]
    #[must_use]
    pub fn is_post_only(&self) -> bool {
        self.flags.contains(OrderFlags::POST_ONLY)
    }

    /// Pack side, kind, time-in-force and flags into the 16-bit wire word
    /// used by `Add` journal records.
    ///
    /// Layout: bits 0-1 side, bits 2-3 kind, bits 4-5 time-in-force,
    /// bits 6-8 flags.
    #[must_use]
    pub fn packed_attributes(&self) -> u16 {
        u16::from(self.side.wire_code())
            | (self.kind.wire_code() << 2)
            | (self.time_in_force.wire_code() << 4)
            | (u16::from(self.flags.bits()) << 6)
    }

    /// Decode the wire word produced by [`Order::packed_attributes`].
    ///
    /// # Errors
    ///
    /// Returns [`PackedOrderError`] when any field holds a code outside its
    /// domain (including flag bits beyond the defined set).
    pub fn unpack_attributes(
        packed: u16,
    ) -> Result<(Side, OrderKind, TimeInForce, OrderFlags), PackedOrderError> {
        let side =
            Side::from_wire_code((packed & 0b11) as u8).ok_or(PackedOrderError(packed))?;
        let kind =
            OrderKind::from_wire_code((packed >> 2) & 0b11).ok_or(PackedOrderError(packed))?;
        let tif =
            TimeInForce::from_wire_code((packed >> 4) & 0b11).ok_or(PackedOrderError(packed))?;
        let flag_bits = (packed >> 6) as u8;
        let flags = OrderFlags::from_bits(flag_bits).ok_or(PackedOrderError(packed))?;
        Ok((side, kind, tif, flags))
    }
}
