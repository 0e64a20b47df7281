//! Fill records produced by the matching engine.

use super::side::Side;
use super::{InstrumentId, OrderId, Price, Qty, SeqNum, TimestampUs};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a fill provided liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Liquidity {
    /// The resting (passive) side.
    Maker,
    /// The incoming (aggressor) side.
    Taker,
}

/// One execution between an aggressor and a resting order.
///
/// Fills are immutable once emitted. The engine returns them by value and
/// retains no reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C, align(8))]
pub struct Fill {
    /// Equal to the sequence number assigned at match time.
    pub fill_id: SeqNum,
    /// The incoming crossing order.
    pub aggressor_order_id: OrderId,
    /// The resting order it matched.
    pub passive_order_id: OrderId,
    /// The instrument traded.
    pub instrument_id: InstrumentId,
    /// Execution price: the passive level's price.
    pub price: Price,
    /// Executed quantity, always positive.
    pub quantity: Qty,
    /// Side of the aggressor.
    pub side: Side,
    /// Whether the passive order was hidden.
    pub is_hidden: bool,
    /// Liquidity classification seen from the aggressor (always `Taker`
    /// for fills emitted by `process_order`; the passive side carries
    /// `Maker`).
    pub liquidity: Liquidity,
    /// Timestamp of the `process_order` call that produced this fill.
    pub timestamp: TimestampUs,
    /// Strictly greater than the sequence of the event that created the
    /// passive order.
    pub sequence_number: SeqNum,
}

impl Fill {
    /// Order id on the buy side of this execution.
    #[inline]
    #[must_use]
    pub fn buy_order_id(&self) -> OrderId {
        match self.side {
            Side::Buy => self.aggressor_order_id,
            Side::Sell => self.passive_order_id,
        }
    }

    /// Order id on the sell side of this execution.
    #[inline]
    #[must_use]
    pub fn sell_order_id(&self) -> OrderId {
        match self.side {
            Side::Buy => self.passive_order_id,
            Side::Sell => self.aggressor_order_id,
        }
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fill #{} {} {}@{} aggressor={} passive={}",
            self.fill_id,
            self.side,
            self.quantity,
            self.price,
            self.aggressor_order_id,
            self.passive_order_id
        )
    }
}
