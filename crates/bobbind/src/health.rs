//! Structured health reporting for host lifecycle events.

use std::sync::Arc;

use bobbin_config::Config;

use crate::bootstrap::BootstrapError;
use crate::transport::TransportError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once an editor session has been attached to the dispatcher.
    fn session_attached(&self);

    /// Invoked when the editor session ends, with the transport error that
    /// ended it, if any.
    fn session_disconnected(&self, error: Option<&TransportError>);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn session_attached(&self) {
        (**self).session_attached();
    }

    fn session_disconnected(&self, error: Option<&TransportError>) {
        (**self).session_disconnected(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting host bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            plugin_runner = config.plugin_runner(),
            plugin_timeout_secs = config.plugin_timeout_secs,
            "host bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "host bootstrap failed"
        );
    }

    fn session_attached(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_attached",
            "editor session attached"
        );
    }

    fn session_disconnected(&self, error: Option<&TransportError>) {
        match error {
            Some(error) => tracing::warn!(
                target: HEALTH_TARGET,
                event = "session_disconnected",
                error = %error,
                "editor session ended with a transport error"
            ),
            None => tracing::info!(
                target: HEALTH_TARGET,
                event = "session_disconnected",
                "editor session ended"
            ),
        }
    }
}
