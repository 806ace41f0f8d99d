use crate::logging::LogFormat;

/// Default log filter expression used by the host binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default per-exchange timeout, in seconds, for process plugins.
pub const DEFAULT_PLUGIN_TIMEOUT_SECS: u64 = 30;

/// Largest accepted per-exchange plugin timeout: one day.
pub const MAX_PLUGIN_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Default log filter expression used by the host binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the host binary.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default plugin timeout used by serde when the field is absent.
pub fn default_plugin_timeout_secs() -> u64 {
    DEFAULT_PLUGIN_TIMEOUT_SECS
}
