//! Append-only binary event journal: codec, writer and reader.
//!
//! Layout of a journal file:
//!
//! ```text
//! header (64 B) | event₁ | event₂ | … | footer (32 B)
//! ```
//!
//! Events are variable-size by type; the size is uniquely determined by
//! the event type byte. Little-endian throughout. One writer owns one
//! file; readers never mutate it.

mod codec;
mod error;
mod event;
mod reader;
mod writer;

pub use codec::{
    EVENT_PREFIX_SIZE, EVENT_TYPE_MASK, FOOTER_SIZE, HEADER_FLAG_AMEND_REJECT_SIZE_UP,
    HEADER_SIZE, JOURNAL_MAGIC, JOURNAL_VERSION, JournalFooter, JournalHeader, MAX_EVENT_SIZE,
    RECORD_FLAG_COMPRESSED, RECORD_FLAG_HAS_CHECKSUM, clamp_wire_qty, deserialize_event,
    event_size, footer_checksum, serialize_event,
};
pub use error::JournalError;
pub use event::{AuditEvent, EventType};
pub use reader::{EventDescriptor, JournalCallbacks, JournalReader};
pub use writer::{JournalWriter, WRITE_BUFFER_SIZE};
