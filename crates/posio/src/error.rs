//! Error types for positional operations.

use crate::config::IoStrategy;
use std::io;
use thiserror::Error;

/// Result type for positional operations.
pub type PosResult<T> = Result<T, PosError>;

/// Errors that can occur during positional operations.
///
/// "No data at this offset" is not an error; it is reported as `Ok(None)`
/// by the read operations.
#[derive(Debug, Error)]
pub enum PosError {
    /// The underlying store reported an I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An argument was outside the range the store can address.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// The store accepted fewer bytes than requested without reporting
    /// that it was out of space.
    #[error("short write: wrote {written} of {requested} bytes")]
    ShortWrite {
        /// Number of bytes the caller asked to write.
        requested: usize,
        /// Number of bytes the store accepted.
        written: usize,
    },

    /// The stream has been closed for reading.
    #[error("stream not opened for reading")]
    NotReadable,

    /// The stream has been closed for writing.
    #[error("stream not opened for writing")]
    NotWritable,

    /// The requested I/O strategy is not available on this platform.
    #[error("I/O strategy {strategy:?} is not supported on this platform")]
    Unsupported {
        /// The strategy that was requested.
        strategy: IoStrategy,
    },
}

impl PosError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
