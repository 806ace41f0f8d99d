//! Error types for the session transport.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced while reading or writing session frames.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[source] Arc<io::Error>),

    #[error("failed to serialise frame: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("malformed frame: {message}")]
    MalformedFrame { message: String },

    #[error("frame of {size} bytes exceeds {max_size} byte limit")]
    FrameTooLarge { size: usize, max_size: usize },

    #[error("frame writer lock poisoned")]
    LockPoisoned,
}

impl TransportError {
    /// Creates a malformed frame error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        Self::Io(Arc::new(error))
    }
}
