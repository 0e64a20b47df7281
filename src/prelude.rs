//! Prelude module that re-exports the commonly used types.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use matchbook::prelude::*;
//! ```

// Core book types
pub use crate::book::{
    AmendOutcome, AmendPolicy, BookListener, NullListener, OrderBook, OrderBookEntry,
    OrderBookError, OrderBookSnapshot,
};

// Journal types
pub use crate::journal::{AuditEvent, EventType, JournalError, JournalReader, JournalWriter};

// Session and replay
pub use crate::replay::{ReplayError, ReplaySession};
pub use crate::session::{Session, SessionConfig, SessionError};

// Simulation models
pub use crate::models::{LatencyModel, ModelConfig, SlippageEstimate, VenueLatency};

// Deterministic infrastructure
pub use crate::sim::{CancelToken, SessionRng, SpscRing, VirtualClock};

// Primitives
pub use crate::types::{
    Bbo, Fill, Liquidity, Order, OrderFlags, OrderId, OrderKind, OrderStatus, Price, Qty,
    Quote, RejectReason, Side, TimeInForce,
};

// Utility functions
pub use crate::utils::current_time_micros;
