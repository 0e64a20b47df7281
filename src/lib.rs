//! # matchbook
//!
//! A price-time-priority limit order book with L3 (per-order) queue
//! tracking, a fixed-layout append-only event journal, and bit-identical
//! deterministic replay, built as the core of a trading simulator.
//!
//! ## Key Features
//!
//! - **Price-time-priority matching** with partial fills, hidden/iceberg
//!   orders, post-only semantics and Day/IOC/FOK/GTC time-in-force,
//!   including deterministic tie-breaking on timestamp collisions.
//! - **L3 queue tracking**: every resting order is a pool-allocated node
//!   in its level's FIFO queue, so queue position and quantity-ahead are
//!   first-class queries.
//! - **Append-only binary journal**: every book-mutating event is encoded
//!   into a fixed-layout little-endian record and appended through a
//!   buffered writer; readers memory-map the file for sequential and
//!   random access.
//! - **Deterministic replay**: replaying a journal re-drives the same
//!   matching engine with the recorded timestamps and reproduces the live
//!   session's fills bit-for-bit. Two sessions with identical inputs and
//!   the same session seed produce byte-identical journals.
//! - **Seeded simulation models**: queue-position, fill-probability,
//!   square-root-impact slippage and per-venue log-normal latency
//!   estimators, all drawing from one integer-only PRNG seeded by the
//!   session seed.
//!
//! ## Design
//!
//! The book, the matching engine and the journal writer form one logical
//! serial actor per instrument; operations run to completion and events
//! are totally ordered by a sequence number assigned at the commit point
//! inside `process_order`. Different instruments run in parallel actors
//! that share no mutable state; producers hand orders to an actor through
//! cache-padded SPSC rings.
//!
//! Within one operation the book mutates first and the journal write
//! follows. A journal write failure therefore leaves the in-memory state
//! advanced: sessions either tolerate the audit loss and flag it, or run
//! with `strict_journal` and halt for operator intervention. Lock-stepping
//! the mutation to the write would need a transactional structure that is
//! incompatible with the latency target.
//!
//! ## Example
//!
//! ```
//! use matchbook::prelude::*;
//!
//! let mut book = OrderBook::new(1);
//! book.submit_limit(1, Side::Sell, 100, 10, 1).unwrap();
//! let fills = book.submit_market(2, Side::Buy, 4, 2).unwrap();
//! assert_eq!(fills.len(), 1);
//! assert_eq!((fills[0].price, fills[0].quantity), (100, 4));
//! ```
//!
//! Journaled sessions wrap the same book:
//!
//! ```no_run
//! use matchbook::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig {
//!     instrument_id: 7,
//!     session_seed: 12345,
//!     ..SessionConfig::default()
//! };
//! let mut session = Session::create(config, "session.mbj")?;
//! session.submit_limit(1, Side::Sell, 100, 10, 1)?;
//! session.submit_market(2, Side::Buy, 4, 2)?;
//! session.close()?;
//!
//! let mut replay = ReplaySession::open("session.mbj")?;
//! replay.replay_all()?;
//! assert_eq!(replay.fills().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod book;
pub mod journal;
pub mod models;
pub mod replay;
pub mod session;
pub mod sim;
pub mod types;

pub mod prelude;
mod utils;

pub use book::{
    AmendOutcome, AmendPolicy, BookListener, NullListener, OrderBook, OrderBookEntry,
    OrderBookError, OrderBookSnapshot,
};
pub use journal::{
    AuditEvent, EventDescriptor, EventType, JournalCallbacks, JournalError, JournalFooter,
    JournalHeader, JournalReader, JournalWriter,
};
pub use models::{
    LatencyModel, ModelConfig, SlippageEstimate, VenueLatency, estimate_slippage,
    fill_probability, time_to_fill,
};
pub use replay::{ReplayError, ReplaySession};
pub use session::{Session, SessionConfig, SessionError};
pub use sim::{CancelToken, RingConsumer, RingProducer, SessionRng, SpscRing, VirtualClock};
pub use types::{
    Bbo, Fill, InstrumentId, Liquidity, Order, OrderFlags, OrderId, OrderKind, OrderStatus,
    Price, Qty, Quote, RejectReason, SeqNum, Side, TimeInForce, TimestampUs,
};
pub use utils::current_time_micros;
