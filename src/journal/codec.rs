//! Fixed-size binary serialization of audit events, file header and
//! footer.
//!
//! Everything is little-endian. Each event record is
//! `flags(1) | timestamp(8) | payload`, where the event type occupies the
//! low 5 bits of the flags byte and the record size is uniquely determined
//! by the type. The encode path never allocates: the caller supplies the
//! byte slice.

use super::error::JournalError;
use super::event::{AuditEvent, EventType};
use crate::types::{InstrumentId, Qty, RejectReason, SeqNum, TimestampUs};

/// File magic, `"KOBO"` when read as little-endian bytes.
pub const JOURNAL_MAGIC: u32 = 0x4F42_4F4B;

/// Current format version.
pub const JOURNAL_VERSION: u16 = 2;

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 64;

/// Size of the file footer in bytes.
pub const FOOTER_SIZE: usize = 32;

/// Bytes of the record prefix shared by every event: flags + timestamp.
pub const EVENT_PREFIX_SIZE: usize = 9;

/// Size of the largest event record (`Amend`).
pub const MAX_EVENT_SIZE: usize = 41;

/// Low 5 bits of the flags byte hold the event type.
pub const EVENT_TYPE_MASK: u8 = 0x1F;

/// Record flag: payload is compressed. Reserved; never set by this version.
pub const RECORD_FLAG_COMPRESSED: u8 = 0x20;

/// Record flag: record carries a per-event checksum. Reserved; never set
/// by this version.
pub const RECORD_FLAG_HAS_CHECKSUM: u8 = 0x40;

/// Header flag: size-up amends are refused instead of resubmitted.
/// Recorded so replay applies the same amend policy as the live session.
pub const HEADER_FLAG_AMEND_REJECT_SIZE_UP: u16 = 0x0001;

/// Record size in bytes for an event type, prefix included.
#[must_use]
pub fn event_size(event_type: EventType) -> usize {
    EVENT_PREFIX_SIZE
        + match event_type {
            EventType::Add => 22,
            EventType::Cancel => 16,
            EventType::Amend => 32,
            EventType::Fill | EventType::Trade => 28,
            EventType::Reject => 21,
            EventType::BboChange => 24,
        }
}

#[inline]
fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_i64(buf: &mut [u8], offset: usize, value: i64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn get_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

#[inline]
fn get_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[inline]
fn get_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

#[inline]
fn get_i64(buf: &[u8], offset: usize) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    i64::from_le_bytes(bytes)
}

/// Encode `event` into `buf`, returning the number of bytes written.
///
/// # Errors
///
/// Returns [`JournalError::InvalidArgument`] when `buf` is smaller than
/// the record size for the event's type.
pub fn serialize_event(buf: &mut [u8], event: &AuditEvent) -> Result<usize, JournalError> {
    let size = event_size(event.event_type());
    if buf.len() < size {
        return Err(JournalError::InvalidArgument {
            message: format!(
                "buffer of {} bytes cannot hold a {} byte {:?} record",
                buf.len(),
                size,
                event.event_type()
            ),
        });
    }

    buf[0] = event.event_type() as u8;
    put_u64(buf, 1, event.timestamp());

    match *event {
        AuditEvent::Add {
            order_id,
            price,
            quantity,
            packed_attributes,
            ..
        } => {
            put_u64(buf, 9, order_id);
            put_i64(buf, 17, price);
            put_u32(buf, 25, quantity);
            put_u16(buf, 29, packed_attributes);
        }
        AuditEvent::Cancel {
            order_id,
            leaves_quantity,
            original_quantity,
            ..
        } => {
            put_u64(buf, 9, order_id);
            put_u32(buf, 17, leaves_quantity);
            put_u32(buf, 21, original_quantity);
        }
        AuditEvent::Amend {
            order_id,
            new_quantity,
            old_quantity,
            new_price,
            old_price,
            ..
        } => {
            put_u64(buf, 9, order_id);
            put_u32(buf, 17, new_quantity);
            put_u32(buf, 21, old_quantity);
            put_i64(buf, 25, new_price);
            put_i64(buf, 33, old_price);
        }
        AuditEvent::Fill {
            price,
            quantity,
            buy_order_id,
            sell_order_id,
            ..
        }
        | AuditEvent::Trade {
            price,
            quantity,
            buy_order_id,
            sell_order_id,
            ..
        } => {
            put_i64(buf, 9, price);
            put_u32(buf, 17, quantity);
            put_u64(buf, 21, buy_order_id);
            put_u64(buf, 29, sell_order_id);
        }
        AuditEvent::Reject {
            order_id,
            reason,
            quantity,
            price,
            ..
        } => {
            put_u64(buf, 9, order_id);
            buf[17] = reason.wire_code();
            put_u32(buf, 18, quantity);
            put_i64(buf, 22, price);
        }
        AuditEvent::BboChange {
            bid_price,
            bid_quantity,
            ask_price,
            ask_quantity,
            ..
        } => {
            put_i64(buf, 9, bid_price);
            put_u32(buf, 17, bid_quantity);
            put_i64(buf, 21, ask_price);
            put_u32(buf, 29, ask_quantity);
        }
    }

    Ok(size)
}

/// Decode one event from the front of `buf`, returning it together with
/// the number of bytes consumed.
///
/// # Errors
///
/// [`JournalError::Truncated`] when `buf` ends inside the record,
/// [`JournalError::InvalidFormat`] on an unknown type code, a compressed
/// record, or an out-of-domain payload field.
pub fn deserialize_event(buf: &[u8]) -> Result<(AuditEvent, usize), JournalError> {
    if buf.is_empty() {
        return Err(JournalError::Truncated { offset: 0 });
    }

    let flags = buf[0];
    if flags & RECORD_FLAG_COMPRESSED != 0 {
        return Err(JournalError::InvalidFormat {
            message: "compressed event records are not supported".to_string(),
        });
    }
    let event_type =
        EventType::from_code(flags & EVENT_TYPE_MASK).ok_or_else(|| JournalError::InvalidFormat {
            message: format!("unknown event type code {}", flags & EVENT_TYPE_MASK),
        })?;

    let size = event_size(event_type);
    if buf.len() < size {
        return Err(JournalError::Truncated { offset: buf.len() });
    }

    let timestamp: TimestampUs = get_u64(buf, 1);

    let event = match event_type {
        EventType::Add => AuditEvent::Add {
            timestamp,
            order_id: get_u64(buf, 9),
            price: get_i64(buf, 17),
            quantity: get_u32(buf, 25),
            packed_attributes: get_u16(buf, 29),
        },
        EventType::Cancel => AuditEvent::Cancel {
            timestamp,
            order_id: get_u64(buf, 9),
            leaves_quantity: get_u32(buf, 17),
            original_quantity: get_u32(buf, 21),
        },
        EventType::Amend => AuditEvent::Amend {
            timestamp,
            order_id: get_u64(buf, 9),
            new_quantity: get_u32(buf, 17),
            old_quantity: get_u32(buf, 21),
            new_price: get_i64(buf, 25),
            old_price: get_i64(buf, 33),
        },
        EventType::Fill => AuditEvent::Fill {
            timestamp,
            price: get_i64(buf, 9),
            quantity: get_u32(buf, 17),
            buy_order_id: get_u64(buf, 21),
            sell_order_id: get_u64(buf, 29),
        },
        EventType::Trade => AuditEvent::Trade {
            timestamp,
            price: get_i64(buf, 9),
            quantity: get_u32(buf, 17),
            buy_order_id: get_u64(buf, 21),
            sell_order_id: get_u64(buf, 29),
        },
        EventType::Reject => AuditEvent::Reject {
            timestamp,
            order_id: get_u64(buf, 9),
            reason: RejectReason::from_wire_code(buf[17]).ok_or_else(|| {
                JournalError::InvalidFormat {
                    message: format!("unknown reject reason code {}", buf[17]),
                }
            })?,
            quantity: get_u32(buf, 18),
            price: get_i64(buf, 22),
        },
        EventType::BboChange => AuditEvent::BboChange {
            timestamp,
            bid_price: get_i64(buf, 9),
            bid_quantity: get_u32(buf, 17),
            ask_price: get_i64(buf, 21),
            ask_quantity: get_u32(buf, 29),
        },
    };

    Ok((event, size))
}

/// The 64-byte journal file header.
///
/// `start_timestamp` / `end_timestamp`, `event_count` and `file_size` are
/// finalized when the writer closes; a journal that was never closed
/// carries zeros there. The session seed occupies the first 8 bytes of
/// the reserved region so replay can reconstruct the session's RNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    /// Format flags (amend policy and future bits).
    pub flags: u16,
    /// The instrument whose events this journal records.
    pub instrument_id: InstrumentId,
    /// Timestamp of the first event.
    pub start_timestamp: TimestampUs,
    /// Timestamp of the last event.
    pub end_timestamp: TimestampUs,
    /// Number of event records between header and footer.
    pub event_count: u64,
    /// Total file size in bytes, footer included.
    pub file_size: u64,
    /// Seed of the session's deterministic RNG streams.
    pub session_seed: u64,
}

impl JournalHeader {
    /// Encode into the fixed 64-byte layout.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        put_u32(&mut buf, 0, JOURNAL_MAGIC);
        put_u16(&mut buf, 4, JOURNAL_VERSION);
        put_u16(&mut buf, 6, self.flags);
        put_u64(&mut buf, 8, self.instrument_id);
        put_u64(&mut buf, 16, self.start_timestamp);
        put_u64(&mut buf, 24, self.end_timestamp);
        put_u64(&mut buf, 32, self.event_count);
        put_u64(&mut buf, 40, self.file_size);
        put_u64(&mut buf, 48, self.session_seed);
        // bytes 56..64 reserved, zeroed
        buf
    }

    /// Decode and validate a header.
    ///
    /// # Errors
    ///
    /// [`JournalError::Truncated`] when fewer than 64 bytes are supplied,
    /// [`JournalError::InvalidFormat`] on a bad magic,
    /// [`JournalError::UnsupportedVersion`] on a version mismatch.
    pub fn decode(buf: &[u8]) -> Result<Self, JournalError> {
        if buf.len() < HEADER_SIZE {
            return Err(JournalError::Truncated { offset: buf.len() });
        }
        let magic = get_u32(buf, 0);
        if magic != JOURNAL_MAGIC {
            return Err(JournalError::InvalidFormat {
                message: format!("bad magic {magic:#010x}"),
            });
        }
        let version = get_u16(buf, 4);
        if version != JOURNAL_VERSION {
            return Err(JournalError::UnsupportedVersion {
                found: version,
                supported: JOURNAL_VERSION,
            });
        }
        Ok(Self {
            flags: get_u16(buf, 6),
            instrument_id: get_u64(buf, 8),
            start_timestamp: get_u64(buf, 16),
            end_timestamp: get_u64(buf, 24),
            event_count: get_u64(buf, 32),
            file_size: get_u64(buf, 40),
            session_seed: get_u64(buf, 48),
        })
    }
}

/// The 32-byte journal file footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalFooter {
    /// Event count, duplicated from the header for cross-checking.
    pub event_count: u64,
    /// Sequence number of the first recorded event.
    pub first_sequence: SeqNum,
    /// Sequence number of the last recorded event.
    pub last_sequence: SeqNum,
    /// Rolling checksum over the 24-byte footer prefix.
    pub checksum: u64,
}

impl JournalFooter {
    /// Build a footer with the checksum computed from the other fields.
    #[must_use]
    pub fn new(event_count: u64, first_sequence: SeqNum, last_sequence: SeqNum) -> Self {
        Self {
            event_count,
            first_sequence,
            last_sequence,
            checksum: footer_checksum(event_count, first_sequence, last_sequence),
        }
    }

    /// Encode into the fixed 32-byte layout.
    #[must_use]
    pub fn encode(&self) -> [u8; FOOTER_SIZE] {
        let mut buf = [0u8; FOOTER_SIZE];
        put_u64(&mut buf, 0, self.event_count);
        put_u64(&mut buf, 8, self.first_sequence);
        put_u64(&mut buf, 16, self.last_sequence);
        put_u64(&mut buf, 24, self.checksum);
        buf
    }

    /// Decode a footer without verifying its checksum.
    ///
    /// # Errors
    ///
    /// [`JournalError::Truncated`] when fewer than 32 bytes are supplied.
    pub fn decode(buf: &[u8]) -> Result<Self, JournalError> {
        if buf.len() < FOOTER_SIZE {
            return Err(JournalError::Truncated { offset: buf.len() });
        }
        Ok(Self {
            event_count: get_u64(buf, 0),
            first_sequence: get_u64(buf, 8),
            last_sequence: get_u64(buf, 16),
            checksum: get_u64(buf, 24),
        })
    }

    /// Recompute the checksum and compare it with the stored one.
    ///
    /// # Errors
    ///
    /// [`JournalError::Integrity`] on a mismatch. Callers may treat this
    /// as a report and continue in degraded replay mode.
    pub fn verify(&self) -> Result<(), JournalError> {
        let actual = footer_checksum(self.event_count, self.first_sequence, self.last_sequence);
        if actual != self.checksum {
            return Err(JournalError::Integrity {
                expected: self.checksum,
                actual,
            });
        }
        Ok(())
    }
}

/// Adler-style rolling sum over the 24 bytes of the footer prefix.
#[must_use]
pub fn footer_checksum(event_count: u64, first_sequence: SeqNum, last_sequence: SeqNum) -> u64 {
    const MOD_ADLER: u64 = 65_521;
    let mut prefix = [0u8; 24];
    prefix[0..8].copy_from_slice(&event_count.to_le_bytes());
    prefix[8..16].copy_from_slice(&first_sequence.to_le_bytes());
    prefix[16..24].copy_from_slice(&last_sequence.to_le_bytes());

    let mut a: u64 = 1;
    let mut b: u64 = 0;
    for byte in prefix {
        a = (a + u64::from(byte)) % MOD_ADLER;
        b = (b + a) % MOD_ADLER;
    }
    (b << 16) | a
}

/// Clamp a 64-bit level aggregate to the 32-bit quantity the BBO wire
/// fields carry.
#[inline]
#[must_use]
pub fn clamp_wire_qty(quantity: u64) -> Qty {
    quantity.min(u64::from(Qty::MAX)) as Qty
}
