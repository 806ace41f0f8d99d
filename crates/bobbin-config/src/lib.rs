//! Shared configuration for the bobbin plugin host.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file (`--config-path` or `BOBBIN_CONFIG_PATH`), then
//! `BOBBIN_*` environment variables, and finally command-line flags. The
//! resulting [`Config`] carries the logging settings consumed by the daemon's
//! telemetry layer and the launch settings for process-backed plugins.

mod defaults;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PLUGIN_TIMEOUT_SECS, MAX_PLUGIN_TIMEOUT_SECS, default_log_filter,
    default_log_filter_string, default_log_format, default_plugin_timeout_secs,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Resolved host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "BOBBIN", post_merge_hook)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive controlling log verbosity.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records written to stderr.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Program used to launch plugin files; the plugin path is appended as
    /// the final argument. Plugin files are executed directly when unset.
    #[serde(default)]
    pub plugin_runner: Option<String>,
    /// Upper bound, in seconds, for a single exchange with a plugin process.
    /// Must lie in `1..=MAX_PLUGIN_TIMEOUT_SECS`.
    #[serde(default = "default_plugin_timeout_secs")]
    #[ortho_config(default = DEFAULT_PLUGIN_TIMEOUT_SECS)]
    pub plugin_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            plugin_runner: None,
            plugin_timeout_secs: DEFAULT_PLUGIN_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Returns the configured log filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the plugin runner program, if one is configured.
    #[must_use]
    pub fn plugin_runner(&self) -> Option<&str> {
        self.plugin_runner
            .as_deref()
            .map(str::trim)
            .filter(|runner| !runner.is_empty())
    }

    /// Returns the per-exchange plugin timeout.
    #[must_use]
    pub const fn plugin_timeout(&self) -> Duration {
        Duration::from_secs(self.plugin_timeout_secs)
    }

    /// Checks values that every layer can express but the host cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`OrthoError::Validation`] when `plugin_timeout_secs` is zero
    /// or exceeds [`MAX_PLUGIN_TIMEOUT_SECS`].
    pub fn validate(&self) -> Result<(), OrthoError> {
        if (1..=MAX_PLUGIN_TIMEOUT_SECS).contains(&self.plugin_timeout_secs) {
            return Ok(());
        }
        Err(OrthoError::Validation {
            key: String::from("plugin_timeout_secs"),
            message: format!(
                "must be between 1 and {MAX_PLUGIN_TIMEOUT_SECS} seconds, got {}",
                self.plugin_timeout_secs
            ),
        })
    }
}

impl PostMergeHook for Config {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        self.validate().map_err(Arc::new)
    }
}
