//! Fixed-layout value types shared by the book, the matching engine and the
//! journal.
//!
//! Prices and quantities are integers (ticks and share units) so arithmetic
//! and comparison are exact; timestamps are microseconds from the session
//! epoch; identifiers are plain unsigned 64-bit integers assigned by the
//! issuer.

mod bbo;
mod fill;
mod order;
mod reject;
mod side;

pub use bbo::{Bbo, Quote};
pub use fill::{Fill, Liquidity};
pub use order::{Order, OrderFlags, OrderKind, OrderStatus, PackedOrderError, TimeInForce};
pub use reject::RejectReason;
pub use side::Side;

/// Unique order identifier, monotonically assigned by the issuer.
pub type OrderId = u64;

/// Identifier of the traded instrument.
pub type InstrumentId = u64;

/// Price in integer ticks. Signed so that invalid (negative) prices are
/// representable and rejected by validation rather than silently wrapped.
pub type Price = i64;

/// Quantity in share units.
pub type Qty = u32;

/// Microseconds since the session epoch.
pub type TimestampUs = u64;

/// Strictly monotone sequence number stamped on every book-mutating or
/// fill-emitting event.
pub type SeqNum = u64;
