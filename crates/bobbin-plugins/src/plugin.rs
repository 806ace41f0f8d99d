//! The capability contract every loaded plugin satisfies.

use serde_json::Value;

use crate::error::PluginError;
use crate::spec::PluginSpec;

/// A live plugin instance owned by the [`PluginCache`](crate::PluginCache).
///
/// Plugins are shared as `Arc<dyn Plugin>` for the duration of a single call.
/// The two policy flags tell the cache whether the instance may be reused on
/// the next resolution of the same filename.
///
/// # Example
///
/// ```
/// use bobbin_plugins::{Plugin, PluginError, PluginSpec, SpecKind};
/// use serde_json::Value;
///
/// struct Echo {
///     specs: Vec<PluginSpec>,
/// }
///
/// impl Plugin for Echo {
///     fn handle_request(
///         &self,
///         _procedure: &str,
///         _call_type: &str,
///         args: &[Value],
///     ) -> Result<Option<Value>, PluginError> {
///         Ok(args.first().cloned())
///     }
///
///     fn specs(&self) -> &[PluginSpec] {
///         &self.specs
///     }
///
///     fn should_cache_module(&self) -> bool {
///         true
///     }
///
///     fn always_init(&self) -> bool {
///         false
///     }
/// }
///
/// let echo = Echo { specs: vec![PluginSpec::new(SpecKind::Function, "Echo")] };
/// let reply = echo.handle_request("Echo", "function", &[Value::from(3)]);
/// assert_eq!(reply.expect("echo"), Some(Value::from(3)));
/// ```
pub trait Plugin: Send + Sync {
    /// Handles one call routed to this plugin.
    ///
    /// Returns `Ok(None)` when the procedure produces no value; the dispatcher
    /// reports that to the editor as `null`.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginError`] when the procedure fails. The error's display
    /// text is what the editor receives.
    fn handle_request(
        &self,
        procedure: &str,
        call_type: &str,
        args: &[Value],
    ) -> Result<Option<Value>, PluginError>;

    /// Entry points the plugin declares to the editor.
    fn specs(&self) -> &[PluginSpec];

    /// Whether the cache may hand this instance out again.
    fn should_cache_module(&self) -> bool;

    /// Whether every resolution must load a fresh instance.
    fn always_init(&self) -> bool;
}
