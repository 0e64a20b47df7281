//! Buffered append-only journal writer.
//!
//! One writer owns one journal file for the lifetime of a session. The
//! header is written at creation with zeroed counters and rewritten by
//! [`JournalWriter::close`] once the final counts are known; the footer is
//! only written by `close`. A writer dropped without `close` still flushes
//! buffered events, so every event handed to `write_event` reaches the
//! file on all normal exit paths, but the resulting journal carries no
//! footer and reads as unfinalized.

use super::codec::{
    self, FOOTER_SIZE, HEADER_SIZE, JournalFooter, JournalHeader, MAX_EVENT_SIZE,
};
use super::error::JournalError;
use super::event::AuditEvent;
use crate::types::{InstrumentId, SeqNum, TimestampUs};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Size of the in-memory append buffer. Flushed to the file whenever the
/// remaining space falls below [`MAX_EVENT_SIZE`].
pub const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Append-only writer for a single journal file.
pub struct JournalWriter {
    file: File,
    path: PathBuf,
    buf: Vec<u8>,
    flags: u16,
    instrument_id: InstrumentId,
    session_seed: u64,
    event_count: u64,
    payload_bytes: u64,
    first_timestamp: Option<TimestampUs>,
    last_timestamp: TimestampUs,
    first_sequence: Option<SeqNum>,
    last_sequence: SeqNum,
    closed: bool,
}

impl JournalWriter {
    /// Create a new journal file. Fails if the file already exists: a
    /// journal has exactly one writer and is never appended to twice.
    ///
    /// # Errors
    ///
    /// [`JournalError::Io`] when the file cannot be created exclusively or
    /// the header cannot be written.
    pub fn create<P: AsRef<Path>>(
        path: P,
        instrument_id: InstrumentId,
        session_seed: u64,
    ) -> Result<Self, JournalError> {
        Self::create_with_flags(path, instrument_id, session_seed, 0)
    }

    /// Like [`JournalWriter::create`], with explicit header flags (amend
    /// policy bit and future format bits).
    ///
    /// # Errors
    ///
    /// [`JournalError::Io`] when the file cannot be created exclusively or
    /// the header cannot be written.
    pub fn create_with_flags<P: AsRef<Path>>(
        path: P,
        instrument_id: InstrumentId,
        session_seed: u64,
        flags: u16,
    ) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| JournalError::Io {
                message: e.to_string(),
                path: Some(path.clone()),
            })?;

        let header = JournalHeader {
            flags,
            instrument_id,
            start_timestamp: 0,
            end_timestamp: 0,
            event_count: 0,
            file_size: 0,
            session_seed,
        };
        file.write_all(&header.encode())
            .map_err(|e| JournalError::Io {
                message: e.to_string(),
                path: Some(path.clone()),
            })?;

        debug!(path = %path.display(), instrument_id, session_seed, "journal created");

        Ok(Self {
            file,
            path,
            buf: Vec::with_capacity(WRITE_BUFFER_SIZE),
            flags,
            instrument_id,
            session_seed,
            event_count: 0,
            payload_bytes: 0,
            first_timestamp: None,
            last_timestamp: 0,
            first_sequence: None,
            last_sequence: 0,
            closed: false,
        })
    }

    /// Append one event with the sequence number the engine assigned it.
    ///
    /// The event lands in the write buffer; the buffer is flushed to the
    /// file once its remaining space falls below the largest record size.
    ///
    /// # Errors
    ///
    /// [`JournalError::InvalidArgument`] after `close`,
    /// [`JournalError::Full`] when the buffer cannot hold the record even
    /// after flushing, [`JournalError::Io`] on flush failure.
    pub fn write_event(&mut self, event: &AuditEvent, sequence: SeqNum) -> Result<(), JournalError> {
        if self.closed {
            return Err(JournalError::InvalidArgument {
                message: "write_event on a closed journal".to_string(),
            });
        }

        if self.buf.len() + MAX_EVENT_SIZE > WRITE_BUFFER_SIZE {
            self.flush()?;
        }

        let mut scratch = [0u8; MAX_EVENT_SIZE];
        let size = codec::serialize_event(&mut scratch, event)?;
        if self.buf.len() + size > WRITE_BUFFER_SIZE {
            return Err(JournalError::Full {
                needed: size,
                capacity: WRITE_BUFFER_SIZE,
            });
        }
        self.buf.extend_from_slice(&scratch[..size]);

        let timestamp = event.timestamp();
        self.first_timestamp.get_or_insert(timestamp);
        self.last_timestamp = timestamp;
        self.first_sequence.get_or_insert(sequence);
        self.last_sequence = sequence;
        self.event_count += 1;
        self.payload_bytes += size as u64;

        trace!(?event, sequence, "journaled");
        Ok(())
    }

    /// Write any buffered events to the file.
    ///
    /// # Errors
    ///
    /// [`JournalError::Io`] on write failure.
    pub fn flush(&mut self) -> Result<(), JournalError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.file.write_all(&self.buf).map_err(|e| JournalError::Io {
            message: e.to_string(),
            path: Some(self.path.clone()),
        })?;
        self.buf.clear();
        Ok(())
    }

    /// Flush, write the footer, finalize the header and release the file
    /// handle.
    ///
    /// # Errors
    ///
    /// [`JournalError::Io`] on any write failure. The file handle is
    /// released regardless.
    pub fn close(mut self) -> Result<(), JournalError> {
        self.flush()?;

        let footer = JournalFooter::new(
            self.event_count,
            self.first_sequence.unwrap_or(0),
            self.last_sequence,
        );
        self.file
            .write_all(&footer.encode())
            .map_err(|e| self.io_error(e))?;

        let header = JournalHeader {
            flags: self.flags,
            instrument_id: self.instrument_id,
            start_timestamp: self.first_timestamp.unwrap_or(0),
            end_timestamp: self.last_timestamp,
            event_count: self.event_count,
            file_size: (HEADER_SIZE + FOOTER_SIZE) as u64 + self.payload_bytes,
            session_seed: self.session_seed,
        };
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| self.io_error(e))?;
        self.file
            .write_all(&header.encode())
            .map_err(|e| self.io_error(e))?;
        self.file.sync_all().map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            events = self.event_count,
            "journal closed"
        );
        self.closed = true;
        Ok(())
    }

    /// Number of events written so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Sequence of the last written event, if any.
    #[must_use]
    pub fn last_sequence(&self) -> Option<SeqNum> {
        self.first_sequence.map(|_| self.last_sequence)
    }

    /// The journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cold]
    fn io_error(&self, err: std::io::Error) -> JournalError {
        JournalError::Io {
            message: err.to_string(),
            path: Some(self.path.clone()),
        }
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        if !self.closed {
            // Buffered events still reach the file; the footer does not.
            let _ = self.flush();
        }
    }
}

impl std::fmt::Debug for JournalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalWriter")
            .field("path", &self.path)
            .field("event_count", &self.event_count)
            .field("buffered", &self.buf.len())
            .field("closed", &self.closed)
            .finish()
    }
}
