//! Minimal RPC client surface handed to plugins.
//!
//! The transport that carries editor traffic implements [`RpcClient`] so that
//! loaded plugins can issue their own calls back over the same connection.

use thiserror::Error;

use serde_json::Value;

/// Errors surfaced by an [`RpcClient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// The connection closed before the call completed.
    #[error("RPC session disconnected")]
    Disconnected,

    /// The remote peer answered with an error payload.
    #[error("remote error: {message}")]
    Remote {
        /// Error text reported by the peer.
        message: String,
    },

    /// The call could not be written to the transport.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },
}

impl RpcError {
    /// Creates a transport failure from any displayable error.
    #[must_use]
    pub fn transport(error: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: error.to_string(),
        }
    }
}

/// Calls into the editor over an attached session.
pub trait RpcClient: Send + Sync {
    /// Issues a request and blocks until the editor replies.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Remote`] when the editor replies with an error,
    /// [`RpcError::Disconnected`] when the session ends first, and
    /// [`RpcError::Transport`] when the request cannot be written.
    fn request(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError>;

    /// Sends a notification without waiting for a reply.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] when the notification cannot be
    /// written.
    fn notify(&self, method: &str, args: Vec<Value>) -> Result<(), RpcError>;
}
