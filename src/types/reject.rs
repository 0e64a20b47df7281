//! Reasons an order can be refused by validation or matching policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an order was rejected. Carried in `Reject` audit events as a single
/// wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// `order_id` was zero.
    BadOrderId,
    /// Negative limit price.
    BadPrice,
    /// Non-positive quantity.
    BadQuantity,
    /// The id is already present in the book's order index.
    DuplicateOrderId,
    /// A post-only order would have crossed and taken liquidity.
    PostOnlyWouldTake,
    /// A fill-or-kill order could not be filled in full.
    FokUnfillable,
    /// A size-up amend arrived while the book is configured to refuse
    /// queue re-entry.
    AmendSizeUp,
}

impl RejectReason {
    /// Wire byte used by the journal codec.
    #[inline]
    #[must_use]
    pub fn wire_code(self) -> u8 {
        match self {
            RejectReason::BadOrderId => 1,
            RejectReason::BadPrice => 2,
            RejectReason::BadQuantity => 3,
            RejectReason::DuplicateOrderId => 4,
            RejectReason::PostOnlyWouldTake => 5,
            RejectReason::FokUnfillable => 6,
            RejectReason::AmendSizeUp => 7,
        }
    }

    /// Decode a wire byte produced by [`RejectReason::wire_code`].
    #[inline]
    #[must_use]
    pub fn from_wire_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RejectReason::BadOrderId),
            2 => Some(RejectReason::BadPrice),
            3 => Some(RejectReason::BadQuantity),
            4 => Some(RejectReason::DuplicateOrderId),
            5 => Some(RejectReason::PostOnlyWouldTake),
            6 => Some(RejectReason::FokUnfillable),
            7 => Some(RejectReason::AmendSizeUp),
            _ => None,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::BadOrderId => write!(f, "bad order id"),
            RejectReason::BadPrice => write!(f, "bad price"),
            RejectReason::BadQuantity => write!(f, "bad quantity"),
            RejectReason::DuplicateOrderId => write!(f, "duplicate order id"),
            RejectReason::PostOnlyWouldTake => write!(f, "post-only order would take"),
            RejectReason::FokUnfillable => write!(f, "fill-or-kill not fillable"),
            RejectReason::AmendSizeUp => write!(f, "size-up amend not allowed"),
        }
    }
}
