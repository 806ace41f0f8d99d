//! Remote plugin host for a modal text editor.
//!
//! The editor starts `bobbind` as a child process and speaks to it over
//! stdin and stdout. Each call names a plugin file, a call type, and a
//! procedure; the host loads the plugin on demand, routes the call, and
//! answers with the plugin's result. Plugins may call back into the editor
//! over the same session.
//!
//! Bootstrap loads layered configuration through [`bobbin_config`], installs
//! structured telemetry on stderr, and reports each lifecycle stage through a
//! [`HealthReporter`]. The resulting [`Host`] then serves one editor session
//! until the editor disconnects.

mod bootstrap;
pub mod dispatch;
mod health;
pub mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Host, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
