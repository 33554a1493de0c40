//! Error types for imwire-client.

use thiserror::Error;

/// Main error type for all imwire operations.
#[derive(Debug, Error)]
pub enum ImwireError {
    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read would run past the end of the buffer.
    #[error("buffer underrun: need {needed} bytes at offset {offset}, {remaining} remaining")]
    BufferUnderrun {
        /// Cursor position at the time of the read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes actually left in the buffer.
        remaining: usize,
    },

    /// Frame structure is invalid (declared body length past the end, etc.).
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Body longer than the u16 length prefix can describe.
    #[error("body of {0} bytes exceeds the 65535-byte frame limit")]
    OversizedBody(usize),

    /// Transport did not report open within the login timeout.
    #[error("connect timed out")]
    ConnectTimeout,

    /// Transport-level connect failure.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Transport rejected a write.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using ImwireError.
pub type Result<T> = std::result::Result<T, ImwireError>;
