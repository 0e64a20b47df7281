//! Error types for the journal subsystem.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while writing or reading a journal file.
#[derive(Debug)]
#[non_exhaustive]
pub enum JournalError {
    /// An I/O error occurred on the journal file.
    Io {
        /// The underlying I/O error message.
        message: String,
        /// The file path involved, if known.
        path: Option<PathBuf>,
    },

    /// The writer's buffer cannot accept the event.
    Full {
        /// Bytes the event needs.
        needed: usize,
        /// Buffer capacity in bytes.
        capacity: usize,
    },

    /// A caller-supplied argument violated an event-type-specific size or
    /// state constraint.
    InvalidArgument {
        /// Description of the violation.
        message: String,
    },

    /// The file is not a journal (bad magic) or an event record is
    /// malformed.
    InvalidFormat {
        /// Description of the format problem.
        message: String,
    },

    /// The journal was written by an unsupported format version.
    UnsupportedVersion {
        /// Version found in the header.
        found: u16,
        /// Version this reader supports.
        supported: u16,
    },

    /// The file or an event record ends before its declared size.
    Truncated {
        /// Byte offset where the truncation was detected.
        offset: usize,
    },

    /// The footer checksum did not match the footer contents. Readers
    /// report this and may continue in degraded replay mode.
    Integrity {
        /// Checksum stored in the footer.
        expected: u64,
        /// Checksum recomputed from the footer prefix.
        actual: u64,
    },
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalError::Io { message, path } => {
                if let Some(p) = path {
                    write!(f, "journal I/O error at {}: {message}", p.display())
                } else {
                    write!(f, "journal I/O error: {message}")
                }
            }
            JournalError::Full { needed, capacity } => {
                write!(
                    f,
                    "journal buffer full: event needs {needed} bytes, capacity {capacity}"
                )
            }
            JournalError::InvalidArgument { message } => {
                write!(f, "invalid journal argument: {message}")
            }
            JournalError::InvalidFormat { message } => {
                write!(f, "invalid journal format: {message}")
            }
            JournalError::UnsupportedVersion { found, supported } => {
                write!(
                    f,
                    "unsupported journal version {found} (this reader supports {supported})"
                )
            }
            JournalError::Truncated { offset } => {
                write!(f, "journal truncated at offset {offset}")
            }
            JournalError::Integrity { expected, actual } => {
                write!(
                    f,
                    "journal footer checksum mismatch: stored {expected:#018x}, computed {actual:#018x}"
                )
            }
        }
    }
}

impl std::error::Error for JournalError {}

impl From<std::io::Error> for JournalError {
    #[cold]
    fn from(err: std::io::Error) -> Self {
        JournalError::Io {
            message: err.to_string(),
            path: None,
        }
    }
}
