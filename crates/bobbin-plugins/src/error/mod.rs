//! Domain errors raised by plugin operations.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors arising from plugin loading and execution.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The loader could not produce a plugin for the filename.
    #[error("plugin '{name}' not found")]
    NotFound {
        /// Filename that was looked up.
        name: String,
    },

    /// The plugin file does not exist on the filesystem.
    #[error("plugin '{name}' executable not found: {path}")]
    ExecutableNotFound {
        /// Plugin filename.
        name: String,
        /// Path that was checked.
        path: PathBuf,
    },

    /// The plugin process could not be spawned.
    #[error("plugin '{name}' failed to start: {message}")]
    SpawnFailed {
        /// Plugin filename.
        name: String,
        /// Human-readable failure description.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// The plugin did not complete within the configured timeout.
    #[error("plugin '{name}' timed out after {timeout_secs}s")]
    Timeout {
        /// Plugin filename.
        name: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The plugin exited with a non-zero status code.
    #[error("plugin '{name}' exited with non-zero status {status}")]
    NonZeroExit {
        /// Plugin filename.
        name: String,
        /// Process exit status.
        status: i32,
    },

    /// The host request could not be serialised to JSON.
    #[error("failed to serialise plugin request: {0}")]
    SerializeRequest(#[source] serde_json::Error),

    /// The plugin reply could not be deserialised from JSON.
    #[error("failed to deserialise plugin reply: {message}")]
    DeserializeResponse {
        /// Human-readable description of the parse failure.
        message: String,
        /// Optional underlying JSON error.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The plugin produced output that does not conform to the protocol.
    #[error("plugin '{name}' wrote invalid output: {message}")]
    InvalidOutput {
        /// Plugin filename.
        name: String,
        /// Description of the protocol violation.
        message: String,
    },

    /// The plugin answered with a reply of the wrong kind.
    #[error("plugin '{name}' sent a {received} reply to a {expected} request")]
    UnexpectedReply {
        /// Plugin filename.
        name: String,
        /// Reply kind the host was waiting for.
        expected: &'static str,
        /// Reply kind the plugin sent.
        received: &'static str,
    },

    /// An I/O error occurred while communicating with the plugin process.
    #[error("I/O error communicating with plugin '{name}': {source}")]
    Io {
        /// Plugin filename.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The plugin's handler reported a failure.
    #[error("{message}")]
    Handler {
        /// Plugin filename.
        name: String,
        /// Failure text surfaced by the plugin.
        message: String,
    },
}

impl PluginError {
    /// Creates a handler failure carrying the plugin's own message.
    #[must_use]
    pub fn handler(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wraps an I/O error raised while talking to the named plugin.
    #[must_use]
    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source: Arc::new(source),
        }
    }
}
