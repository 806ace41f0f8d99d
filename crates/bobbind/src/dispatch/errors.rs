//! Error types for plugin dispatch failures.

use thiserror::Error;

use bobbin_plugins::PluginError;

/// Errors surfaced while routing a call to a plugin.
///
/// The display text is exactly what the editor receives in an error reply.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The filename could not be resolved to a plugin.
    #[error("Could not load plugin: {filename}")]
    PluginNotFound { filename: String },

    /// The plugin failed while handling the call.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

impl DispatchError {
    /// Creates a plugin-not-found error.
    pub fn plugin_not_found(filename: impl Into<String>) -> Self {
        Self::PluginNotFound {
            filename: filename.into(),
        }
    }
}
