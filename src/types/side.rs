//! Order side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The side of an order or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Bid side. Buy orders rest in the bid ladder and sweep asks.
    Buy,
    /// Ask side. Sell orders rest in the ask ladder and sweep bids.
    Sell,
}

impl Side {
    /// The opposite side, i.e. the side an aggressor matches against.
    #[inline]
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Wire code used by the journal codec (1 = Buy, 2 = Sell).
    #[inline]
    #[must_use]
    pub fn wire_code(self) -> u8 {
        match self {
            Side::Buy => 1,
            Side::Sell => 2,
        }
    }

    /// Decode a wire code produced by [`Side::wire_code`].
    #[inline]
    #[must_use]
    pub fn from_wire_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Side::Buy),
            2 => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}
