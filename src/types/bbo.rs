//! Best bid and offer.

use super::{Price, Qty, SeqNum};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single top-of-book quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    /// Price in ticks.
    pub price: Price,
    /// Visible quantity at that price.
    pub quantity: Qty,
}

/// The top of both ladders at a point in time.
///
/// Either side may be absent. Equality of the two quote fields (the
/// sequence is ignored) drives `BboChange` emission: a change event is
/// produced whenever the top of either side changes, including becoming
/// `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bbo {
    /// Best bid, if any.
    pub bid: Option<Quote>,
    /// Best ask, if any.
    pub ask: Option<Quote>,
    /// Sequence at which this view was taken.
    pub sequence: SeqNum,
}

impl Bbo {
    /// Whether the visible tops differ, ignoring the sequence stamp.
    #[inline]
    #[must_use]
    pub fn top_differs(&self, other: &Bbo) -> bool {
        self.bid != other.bid || self.ask != other.ask
    }

    /// Midpoint of the two tops, when both exist.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some((b.price as f64 + a.price as f64) / 2.0),
            _ => None,
        }
    }

    /// Spread in ticks, when both tops exist.
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some(a.price - b.price),
            _ => None,
        }
    }
}

impl fmt::Display for Bbo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bid {
            Some(q) => write!(f, "{}x{}", q.quantity, q.price)?,
            None => write!(f, "-")?,
        }
        write!(f, " | ")?;
        match self.ask {
            Some(q) => write!(f, "{}x{}", q.price, q.quantity),
            None => write!(f, "-"),
        }
    }
}
