//! Deterministic replay of a journal file.
//!
//! Replay re-drives the engine from the journal's inbound records (`Add`,
//! `Cancel`, `Amend`) with their recorded timestamps. Derived records
//! (`Fill`, `Trade`, `Reject`, `BboChange`) are consumed but not
//! re-applied: the engine regenerates them, and because matching is
//! deterministic the regenerated fills match the journaled ones
//! bit-for-bit. Replay never writes a journal.

use crate::book::{AmendPolicy, BookListener, OrderBook, OrderBookError, OrderBookSnapshot};
use crate::journal::{
    AuditEvent, HEADER_FLAG_AMEND_REJECT_SIZE_UP, JournalError, JournalReader,
};
use crate::sim::CancelToken;
use crate::types::{Fill, Order, OrderStatus, TimestampUs};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// The progress callback fires once per this many events.
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Errors surfaced during replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The journal could not be read or decoded.
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    /// The replayed book failed fatally.
    #[error("order book error: {0}")]
    Book(#[from] OrderBookError),
}

/// A replay session over one journal file.
pub struct ReplaySession {
    reader: JournalReader,
    book: OrderBook,
    fills: Vec<Fill>,
    events_processed: u64,
    integrity_degraded: bool,
    cancel: CancelToken,
    progress: Option<Box<dyn FnMut(u64)>>,
}

impl ReplaySession {
    /// Open a journal for replay.
    ///
    /// The footer is verified up front: a checksum mismatch (or a missing
    /// footer from an unclosed writer) is reported via
    /// [`integrity_degraded`](ReplaySession::integrity_degraded) and
    /// replay continues in degraded mode rather than refusing the file.
    ///
    /// # Errors
    ///
    /// Header validation errors from [`JournalReader::open`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let reader = JournalReader::open(path)?;

        let integrity_degraded = match reader.verify_footer() {
            Ok(_) => false,
            Err(e @ (JournalError::Integrity { .. } | JournalError::Truncated { .. })) => {
                warn!(error = %e, "journal integrity check failed; replaying in degraded mode");
                true
            }
            Err(e) => return Err(e.into()),
        };

        let amend_policy = if reader.header().flags & HEADER_FLAG_AMEND_REJECT_SIZE_UP != 0 {
            AmendPolicy::RejectSizeUp
        } else {
            AmendPolicy::CancelResubmit
        };
        let book = OrderBook::new(reader.header().instrument_id).with_amend_policy(amend_policy);

        debug!(
            instrument_id = reader.header().instrument_id,
            events = reader.header().event_count,
            integrity_degraded,
            "replay session opened"
        );

        Ok(Self {
            reader,
            book,
            fills: Vec::new(),
            events_processed: 0,
            integrity_degraded,
            cancel: CancelToken::new(),
            progress: None,
        })
    }

    /// Attach a listener to the replayed book; it observes the same
    /// callback stream the live session produced.
    #[must_use]
    pub fn with_listener(mut self, listener: Box<dyn BookListener>) -> Self {
        self.book.set_listener(Some(listener));
        self
    }

    /// Attach a cancellation token polled between events.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Attach a progress callback invoked every [`PROGRESS_INTERVAL`]
    /// events with the running event count.
    #[must_use]
    pub fn with_progress(mut self, callback: Box<dyn FnMut(u64)>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Consume and apply one journal event. Returns `false` at the end of
    /// the journal.
    ///
    /// # Errors
    ///
    /// Decode errors from the reader; fatal errors from the book.
    pub fn step(&mut self) -> Result<bool, ReplayError> {
        let Some(event) = self.next_event()? else {
            return Ok(false);
        };
        self.apply(&event)?;
        Ok(true)
    }

    /// Replay every remaining event, stopping early on cancellation.
    /// Returns the number of events processed so far.
    ///
    /// # Errors
    ///
    /// See [`ReplaySession::step`].
    pub fn replay_all(&mut self) -> Result<u64, ReplayError> {
        while !self.cancel.is_cancelled() {
            if !self.step()? {
                break;
            }
        }
        Ok(self.events_processed)
    }

    /// Replay events whose timestamp is at most `until`. The first event
    /// past the bound is left unconsumed for a later `step` or
    /// `replay_until` call. Returns the number of events processed so
    /// far.
    ///
    /// # Errors
    ///
    /// See [`ReplaySession::step`].
    pub fn replay_until(&mut self, until: TimestampUs) -> Result<u64, ReplayError> {
        while !self.cancel.is_cancelled() {
            let position = self.reader.position();
            let Some(event) = self.next_event()? else {
                break;
            };
            if event.timestamp() > until {
                self.reader.seek(position)?;
                break;
            }
            self.apply(&event)?;
        }
        Ok(self.events_processed)
    }

    /// Read the next event. A file that ends inside a record (the writer
    /// died mid-flush) ends a degraded replay cleanly instead of
    /// erroring.
    fn next_event(&mut self) -> Result<Option<AuditEvent>, ReplayError> {
        match self.reader.try_read_event() {
            Ok(event) => Ok(event),
            Err(JournalError::Truncated { offset }) if self.integrity_degraded => {
                warn!(offset, "journal truncated mid-record; ending degraded replay");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every fill regenerated so far, in emission order.
    #[must_use]
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Number of journal events consumed.
    #[must_use]
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Whether footer verification failed at open. In degraded mode the
    /// replay still runs, but assertions that depend on checksum-verified
    /// ranges must not be made.
    #[must_use]
    pub fn integrity_degraded(&self) -> bool {
        self.integrity_degraded
    }

    /// The seed of the recorded session.
    #[must_use]
    pub fn session_seed(&self) -> u64 {
        self.reader.session_seed()
    }

    /// The replayed book.
    #[must_use]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Snapshot of the replayed book state.
    #[must_use]
    pub fn snapshot(&self) -> OrderBookSnapshot {
        self.book.snapshot()
    }

    fn apply(&mut self, event: &AuditEvent) -> Result<(), ReplayError> {
        match *event {
            AuditEvent::Add {
                timestamp,
                order_id,
                price,
                quantity,
                packed_attributes,
            } => {
                let (side, kind, time_in_force, flags) =
                    Order::unpack_attributes(packed_attributes).map_err(|e| {
                        JournalError::InvalidFormat {
                            message: e.to_string(),
                        }
                    })?;
                let order = Order {
                    order_id,
                    instrument_id: self.book.instrument_id(),
                    price,
                    arrival_timestamp: timestamp,
                    original_quantity: quantity,
                    leaves_quantity: quantity,
                    display_quantity: 0,
                    queue_position: 0,
                    side,
                    kind,
                    time_in_force,
                    status: OrderStatus::Active,
                    flags,
                };
                let fills = self.book.process_order(order, timestamp)?;
                self.fills.extend(fills);
            }
            AuditEvent::Cancel {
                timestamp, order_id, ..
            } => {
                let _ = self.book.cancel(order_id, timestamp);
            }
            AuditEvent::Amend {
                timestamp,
                order_id,
                new_quantity,
                ..
            } => {
                let outcome = self.book.amend(order_id, new_quantity, timestamp)?;
                if let crate::book::AmendOutcome::Resubmitted { fills, .. } = outcome {
                    self.fills.extend(fills);
                }
            }
            // Derived records: the engine regenerates them.
            AuditEvent::Fill { .. }
            | AuditEvent::Trade { .. }
            | AuditEvent::Reject { .. }
            | AuditEvent::BboChange { .. } => {}
        }

        // Replay is pure consumption; drop the regenerated events.
        let _ = self.book.drain_events();

        self.events_processed += 1;
        if self.events_processed % PROGRESS_INTERVAL == 0
            && let Some(progress) = self.progress.as_mut()
        {
            progress(self.events_processed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ReplaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySession")
            .field("events_processed", &self.events_processed)
            .field("fills", &self.fills.len())
            .field("integrity_degraded", &self.integrity_degraded)
            .finish()
    }
}
