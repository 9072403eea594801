//! Error types for bamchop

use thiserror::Error;

/// Result type alias for bamchop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur when loading, cropping, or writing indexes
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed index data (bad magic, truncated required field,
    /// inconsistent counts). A load that hits this returns no index at all.
    #[error("Invalid index format: {msg}")]
    Format {
        /// Error message
        msg: String,
    },

    /// Reference id is negative or beyond the index's reference count
    #[error("Invalid reference id {ref_id} (index covers {references} references)")]
    InvalidReference {
        /// The offending reference id
        ref_id: i64,
        /// Number of references in the index
        references: usize,
    },

    /// Operation the index formats define but this crate does not implement
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Shorthand for a format error with a formatted message.
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format { msg: msg.into() }
    }
}
