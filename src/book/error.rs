//! Order book error types.

use std::fmt;

/// Errors that can occur within the order book itself.
///
/// Validation failures are not errors: they are domain outcomes reported
/// through `Reject` audit events and [`crate::types::RejectReason`].
#[derive(Debug)]
#[non_exhaustive]
pub enum OrderBookError {
    /// The node pool hit its configured hard cap. This is fatal for the
    /// actor: the book cannot accept further resting orders.
    PoolExhausted {
        /// Nodes currently in use.
        in_use: usize,
        /// The configured cap.
        max_nodes: usize,
    },

    /// Error while serializing snapshot data.
    SerializationError {
        /// Underlying error message.
        message: String,
    },

    /// Error while deserializing snapshot data.
    DeserializationError {
        /// Underlying error message.
        message: String,
    },

    /// Snapshot integrity check failed.
    ChecksumMismatch {
        /// Expected digest value.
        expected: String,
        /// Actual digest value.
        actual: String,
    },
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::PoolExhausted { in_use, max_nodes } => {
                write!(
                    f,
                    "order node pool exhausted: {in_use} nodes in use, cap {max_nodes}"
                )
            }
            OrderBookError::SerializationError { message } => {
                write!(f, "snapshot serialization error: {message}")
            }
            OrderBookError::DeserializationError { message } => {
                write!(f, "snapshot deserialization error: {message}")
            }
            OrderBookError::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "snapshot checksum mismatch: expected {expected}, but computed {actual}"
                )
            }
        }
    }
}

impl std::error::Error for OrderBookError {}
