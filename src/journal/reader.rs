//! Sequential and random-access journal reader.
//!
//! The reader memory-maps the file read-only and walks event records
//! between the header and the footer. It never mutates the file.

use super::codec::{self, FOOTER_SIZE, HEADER_SIZE, JournalFooter, JournalHeader};
use super::error::JournalError;
use super::event::{AuditEvent, EventType};
use crate::sim::CancelToken;
use crate::types::TimestampUs;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Position, size and type of one event record, as produced by
/// [`JournalReader::build_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptor {
    /// Byte offset of the record from the start of the file.
    pub position: u64,
    /// Record size in bytes.
    pub size: u32,
    /// The record's event type.
    pub event_type: EventType,
    /// The record's timestamp.
    pub timestamp: TimestampUs,
}

/// Optional per-type callbacks for [`JournalReader::read_with_callbacks`].
///
/// `on_trade` receives both `Fill` and `Trade` records. `on_any` fires for
/// every record after the type-specific callback.
#[derive(Default)]
pub struct JournalCallbacks<'a> {
    /// Invoked for `Add` records.
    pub on_add: Option<Box<dyn FnMut(&AuditEvent) + 'a>>,
    /// Invoked for `Cancel` records.
    pub on_cancel: Option<Box<dyn FnMut(&AuditEvent) + 'a>>,
    /// Invoked for `Fill` and `Trade` records.
    pub on_trade: Option<Box<dyn FnMut(&AuditEvent) + 'a>>,
    /// Invoked for `BboChange` records.
    pub on_bbo: Option<Box<dyn FnMut(&AuditEvent) + 'a>>,
    /// Invoked for every record.
    pub on_any: Option<Box<dyn FnMut(&AuditEvent) + 'a>>,
}

/// Read-only view over a finalized (or still-unfinalized) journal file.
pub struct JournalReader {
    mmap: Mmap,
    path: PathBuf,
    header: JournalHeader,
    pos: usize,
    data_end: usize,
    has_footer: bool,
}

impl JournalReader {
    /// Open a journal file and validate its header.
    ///
    /// A journal whose writer died before `close` has no footer; it can
    /// still be read sequentially to the end of its last whole record.
    ///
    /// # Errors
    ///
    /// [`JournalError::Io`] when the file cannot be opened or mapped,
    /// [`JournalError::Truncated`] when it is smaller than a header,
    /// [`JournalError::InvalidFormat`] / [`JournalError::UnsupportedVersion`]
    /// from header validation.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| JournalError::Io {
            message: e.to_string(),
            path: Some(path.clone()),
        })?;

        // SAFETY: read-only mapping; the single-writer discipline means no
        // live writer holds this file once a reader opens it.
        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| JournalError::Io {
                message: e.to_string(),
                path: Some(path.clone()),
            })?
        };

        if mmap.len() < HEADER_SIZE {
            return Err(JournalError::Truncated { offset: mmap.len() });
        }
        let header = JournalHeader::decode(&mmap[..HEADER_SIZE])?;

        // A finalized journal records its own size; trust the smaller of
        // the header claim and the actual mapping.
        let has_footer = header.file_size as usize == mmap.len()
            && mmap.len() >= HEADER_SIZE + FOOTER_SIZE;
        let data_end = if has_footer {
            mmap.len() - FOOTER_SIZE
        } else {
            mmap.len()
        };

        debug!(
            path = %path.display(),
            events = header.event_count,
            has_footer,
            "journal opened"
        );

        Ok(Self {
            mmap,
            path,
            header,
            pos: HEADER_SIZE,
            data_end,
            has_footer,
        })
    }

    /// The validated file header.
    #[must_use]
    pub fn header(&self) -> &JournalHeader {
        &self.header
    }

    /// The session seed recorded at creation.
    #[must_use]
    pub fn session_seed(&self) -> u64 {
        self.header.session_seed
    }

    /// Whether the file carries a footer (i.e. the writer closed cleanly).
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.has_footer
    }

    /// Current cursor position in bytes from the start of the file.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// The journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the cursor to an absolute byte position.
    ///
    /// The position must fall inside the event region; positions from
    /// [`JournalReader::build_index`] are always valid.
    ///
    /// # Errors
    ///
    /// [`JournalError::InvalidArgument`] when the position lies outside
    /// `[header end, footer start]`.
    pub fn seek(&mut self, position: u64) -> Result<(), JournalError> {
        let position = position as usize;
        if position < HEADER_SIZE || position > self.data_end {
            return Err(JournalError::InvalidArgument {
                message: format!(
                    "seek position {position} outside event region [{HEADER_SIZE}, {}]",
                    self.data_end
                ),
            });
        }
        self.pos = position;
        Ok(())
    }

    /// Read the next event, advancing the cursor. Returns `None` at the
    /// end of the event region.
    ///
    /// # Errors
    ///
    /// Decode errors from the codec; the cursor is not advanced on error.
    pub fn try_read_event(&mut self) -> Result<Option<AuditEvent>, JournalError> {
        if self.pos >= self.data_end {
            return Ok(None);
        }
        let (event, size) = codec::deserialize_event(&self.mmap[self.pos..self.data_end])
            .map_err(|e| match e {
                // A record running past the footer means a truncated file,
                // not a short caller buffer; report the absolute offset.
                JournalError::Truncated { .. } => JournalError::Truncated { offset: self.pos },
                other => other,
            })?;
        self.pos += size;
        Ok(Some(event))
    }

    /// Read every remaining event, invoking `callback` for each. Returns
    /// the number of events read.
    ///
    /// # Errors
    ///
    /// Decode errors from the codec.
    pub fn read_all<F>(&mut self, mut callback: F) -> Result<u64, JournalError>
    where
        F: FnMut(&AuditEvent),
    {
        let mut count = 0u64;
        while let Some(event) = self.try_read_event()? {
            callback(&event);
            count += 1;
        }
        Ok(count)
    }

    /// Read every remaining event, dispatching to per-type callbacks.
    /// Returns the number of events read.
    ///
    /// # Errors
    ///
    /// Decode errors from the codec.
    pub fn read_with_callbacks(
        &mut self,
        callbacks: &mut JournalCallbacks<'_>,
    ) -> Result<u64, JournalError> {
        let mut count = 0u64;
        while let Some(event) = self.try_read_event()? {
            let specific = match event.event_type() {
                EventType::Add => callbacks.on_add.as_mut(),
                EventType::Cancel => callbacks.on_cancel.as_mut(),
                EventType::Fill | EventType::Trade => callbacks.on_trade.as_mut(),
                EventType::BboChange => callbacks.on_bbo.as_mut(),
                EventType::Amend | EventType::Reject => None,
            };
            if let Some(cb) = specific {
                cb(&event);
            }
            if let Some(cb) = callbacks.on_any.as_mut() {
                cb(&event);
            }
            count += 1;
        }
        Ok(count)
    }

    /// Produce one descriptor per event, leaving the cursor where it was.
    ///
    /// # Errors
    ///
    /// Decode errors from the codec.
    pub fn build_index(&mut self) -> Result<Vec<EventDescriptor>, JournalError> {
        self.build_index_cancellable(&CancelToken::new())
    }

    /// [`JournalReader::build_index`] with a cancellation token polled
    /// between events. On cancellation the partial index is returned.
    ///
    /// # Errors
    ///
    /// Decode errors from the codec.
    pub fn build_index_cancellable(
        &mut self,
        token: &CancelToken,
    ) -> Result<Vec<EventDescriptor>, JournalError> {
        let saved = self.pos;
        self.pos = HEADER_SIZE;

        let mut index = Vec::new();
        let result = loop {
            if token.is_cancelled() {
                break Ok(());
            }
            let position = self.pos as u64;
            match self.try_read_event() {
                Ok(Some(event)) => {
                    let size = codec::event_size(event.event_type()) as u32;
                    index.push(EventDescriptor {
                        position,
                        size,
                        event_type: event.event_type(),
                        timestamp: event.timestamp(),
                    });
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.pos = saved;
        result.map(|()| index)
    }

    /// Decode the footer without verifying it.
    ///
    /// # Errors
    ///
    /// [`JournalError::Truncated`] when the file carries no footer.
    pub fn footer(&self) -> Result<JournalFooter, JournalError> {
        if !self.has_footer {
            return Err(JournalError::Truncated {
                offset: self.mmap.len(),
            });
        }
        JournalFooter::decode(&self.mmap[self.mmap.len() - FOOTER_SIZE..])
    }

    /// Decode the footer and verify its checksum.
    ///
    /// # Errors
    ///
    /// [`JournalError::Truncated`] without a footer,
    /// [`JournalError::Integrity`] on checksum mismatch. Integrity
    /// failures are reports: callers may continue reading in degraded
    /// mode.
    pub fn verify_footer(&self) -> Result<JournalFooter, JournalError> {
        let footer = self.footer()?;
        footer.verify()?;
        Ok(footer)
    }
}

impl std::fmt::Debug for JournalReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalReader")
            .field("path", &self.path)
            .field("pos", &self.pos)
            .field("data_end", &self.data_end)
            .field("has_footer", &self.has_footer)
            .finish()
    }
}
