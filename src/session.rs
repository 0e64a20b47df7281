//! A live trading session: the book, its journal writer, the seeded
//! models and the virtual clock wired together.
//!
//! Within `submit`/`cancel`/`amend` the book mutates first and the
//! journal write follows. If the write fails, the in-memory state has
//! already advanced: with `strict_journal` the session halts and refuses
//! further operations; otherwise it degrades to in-memory only and flags
//! the loss.

use crate::book::{
    AmendOutcome, AmendPolicy, BookListener, OrderBook, OrderBookError, OrderBookSnapshot,
};
use crate::journal::{HEADER_FLAG_AMEND_REJECT_SIZE_UP, JournalError, JournalWriter};
use crate::models::{
    LatencyModel, ModelConfig, SlippageEstimate, estimate_slippage, fill_probability,
    time_to_fill,
};
use crate::sim::{SessionRng, VirtualClock};
use crate::types::{Fill, InstrumentId, Order, OrderId, Price, Qty, Side, TimestampUs};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by a live session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The journal writer failed.
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    /// The book failed fatally (pool exhaustion).
    #[error("order book error: {0}")]
    Book(#[from] OrderBookError),

    /// The session halted after a strict-journal write failure; operator
    /// intervention restores from the last good snapshot.
    #[error("session halted after a strict-journal write failure")]
    Halted,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The instrument this session trades.
    pub instrument_id: InstrumentId,
    /// Seed for every deterministic PRNG stream in the session. Recorded
    /// in the journal header.
    pub session_seed: u64,
    /// When true, a journal write failure halts the session instead of
    /// degrading to in-memory.
    pub strict_journal: bool,
    /// Amend size-up policy. Recorded in the journal header so replay
    /// applies the same policy.
    pub amend_policy: AmendPolicy,
    /// Queue and slippage model coefficients.
    pub model: ModelConfig,
    /// Per-venue latency table.
    pub latency: LatencyModel,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            instrument_id: 1,
            session_seed: 0,
            strict_journal: false,
            amend_policy: AmendPolicy::default(),
            model: ModelConfig::default(),
            latency: LatencyModel::default(),
        }
    }
}

/// One live matching session over one instrument.
pub struct Session {
    config: SessionConfig,
    book: OrderBook,
    writer: Option<JournalWriter>,
    rng: SessionRng,
    clock: VirtualClock,
    journal_degraded: bool,
    halted: bool,
}

impl Session {
    /// A session without a journal (pure in-memory simulation).
    #[must_use]
    pub fn in_memory(config: SessionConfig) -> Self {
        let book = OrderBook::new(config.instrument_id).with_amend_policy(config.amend_policy);
        let rng = SessionRng::new(config.session_seed);
        Self {
            config,
            book,
            writer: None,
            rng,
            clock: VirtualClock::new(),
            journal_degraded: false,
            halted: false,
        }
    }

    /// A session journaling to a new file at `path`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Journal`] when the file cannot be created.
    pub fn create<P: AsRef<Path>>(
        config: SessionConfig,
        path: P,
    ) -> Result<Self, SessionError> {
        let flags = match config.amend_policy {
            AmendPolicy::CancelResubmit => 0,
            AmendPolicy::RejectSizeUp => HEADER_FLAG_AMEND_REJECT_SIZE_UP,
        };
        let writer = JournalWriter::create_with_flags(
            path,
            config.instrument_id,
            config.session_seed,
            flags,
        )?;
        let mut session = Self::in_memory(config);
        session.writer = Some(writer);
        Ok(session)
    }

    /// Attach a listener invoked synchronously inside the matching actor.
    #[must_use]
    pub fn with_listener(mut self, listener: Box<dyn BookListener>) -> Self {
        self.book.set_listener(Some(listener));
        self
    }

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// [`SessionError::Halted`] once the session halted,
    /// [`SessionError::Book`] on fatal book errors,
    /// [`SessionError::Journal`] under `strict_journal` when the write
    /// fails.
    pub fn submit(
        &mut self,
        order: Order,
        timestamp: TimestampUs,
    ) -> Result<Vec<Fill>, SessionError> {
        self.ensure_running()?;
        self.clock.set(timestamp);
        let fills = self.book.submit(order, timestamp)?;
        self.journal_pending()?;
        Ok(fills)
    }

    /// Submit a plain limit order.
    ///
    /// # Errors
    ///
    /// See [`Session::submit`].
    pub fn submit_limit(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Qty,
        timestamp: TimestampUs,
    ) -> Result<Vec<Fill>, SessionError> {
        let order = Order::limit(order_id, self.config.instrument_id, side, price, quantity);
        self.submit(order, timestamp)
    }

    /// Submit a market order.
    ///
    /// # Errors
    ///
    /// See [`Session::submit`].
    pub fn submit_market(
        &mut self,
        order_id: OrderId,
        side: Side,
        quantity: Qty,
        timestamp: TimestampUs,
    ) -> Result<Vec<Fill>, SessionError> {
        let order = Order::market(order_id, self.config.instrument_id, side, quantity);
        self.submit(order, timestamp)
    }

    /// Cancel a resting order. `Ok(None)` for unknown ids.
    ///
    /// # Errors
    ///
    /// See [`Session::submit`].
    pub fn cancel(
        &mut self,
        order_id: OrderId,
        timestamp: TimestampUs,
    ) -> Result<Option<Order>, SessionError> {
        self.ensure_running()?;
        self.clock.set(timestamp);
        let canceled = self.book.cancel(order_id, timestamp);
        self.journal_pending()?;
        Ok(canceled)
    }

    /// Amend a resting order's quantity.
    ///
    /// # Errors
    ///
    /// See [`Session::submit`].
    pub fn amend(
        &mut self,
        order_id: OrderId,
        new_quantity: Qty,
        timestamp: TimestampUs,
    ) -> Result<AmendOutcome, SessionError> {
        self.ensure_running()?;
        self.clock.set(timestamp);
        let outcome = self.book.amend(order_id, new_quantity, timestamp)?;
        self.journal_pending()?;
        Ok(outcome)
    }

    /// Finalize the journal (footer and final header) and end the
    /// session.
    ///
    /// # Errors
    ///
    /// [`SessionError::Journal`] when finalization fails.
    pub fn close(mut self) -> Result<(), SessionError> {
        if let Some(writer) = self.writer.take() {
            writer.close()?;
        }
        Ok(())
    }

    /// The underlying book, read-only. The session is the sole mutator.
    #[must_use]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Snapshot of the current book state.
    #[must_use]
    pub fn snapshot(&self) -> OrderBookSnapshot {
        self.book.snapshot()
    }

    /// Best bid and ask with sizes, when both sides exist.
    #[must_use]
    pub fn best_bid_ask(&self) -> Option<(Price, Qty, Price, Qty)> {
        self.book.best_bid_ask()
    }

    /// Slippage estimate for a hypothetical order of `quantity` shares.
    #[must_use]
    pub fn slippage(&self, quantity: Qty) -> SlippageEstimate {
        estimate_slippage(&self.config.model, quantity)
    }

    /// Expected seconds for a resting order to reach the queue front.
    #[must_use]
    pub fn time_to_fill(&self, order_id: OrderId) -> Option<f64> {
        time_to_fill(&self.book, &self.config.model, order_id)
    }

    /// Probability a resting order fills within `window_secs`.
    #[must_use]
    pub fn fill_probability(&self, order_id: OrderId, window_secs: f64) -> Option<f64> {
        fill_probability(&self.book, &self.config.model, order_id, window_secs)
    }

    /// Draw one venue latency sample in microseconds.
    #[must_use]
    pub fn latency_sample_us(&mut self, venue_index: usize) -> Option<f64> {
        self.config.latency.sample_us(venue_index, &mut self.rng)
    }

    /// The session seed.
    #[must_use]
    pub fn session_seed(&self) -> u64 {
        self.config.session_seed
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> TimestampUs {
        self.clock.now()
    }

    /// Whether a journal write failed and the session fell back to
    /// in-memory operation.
    #[must_use]
    pub fn journal_degraded(&self) -> bool {
        self.journal_degraded
    }

    /// Whether the session halted (strict journal mode).
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        if self.halted {
            return Err(SessionError::Halted);
        }
        Ok(())
    }

    /// Drain the book's pending audit events into the journal. The book
    /// has already mutated; see the module docs for the failure policy.
    fn journal_pending(&mut self) -> Result<(), SessionError> {
        let events = self.book.drain_events();
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for (sequence, event) in &events {
            if let Err(e) = writer.write_event(event, *sequence) {
                if self.config.strict_journal {
                    self.halted = true;
                    warn!(error = %e, "journal write failed; halting session");
                    return Err(SessionError::Journal(e));
                }
                warn!(error = %e, "journal write failed; degrading to in-memory");
                self.journal_degraded = true;
                self.writer = None;
                break;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("instrument_id", &self.config.instrument_id)
            .field("session_seed", &self.config.session_seed)
            .field("journaling", &self.writer.is_some())
            .field("degraded", &self.journal_degraded)
            .field("halted", &self.halted)
            .finish()
    }
}
