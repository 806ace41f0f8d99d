//! Loader contract used by the cache to materialise plugins.

use std::sync::Arc;

use crate::client::RpcClient;
use crate::error::PluginError;
use crate::plugin::Plugin;

/// Options forwarded to a [`PluginLoader`].
///
/// `cache` carries the previously cached instance's
/// [`should_cache_module`](Plugin::should_cache_module) flag, or `None` when
/// the filename has not been loaded before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    cache: Option<bool>,
}

impl LoadOptions {
    /// Creates options with no cache hint.
    #[must_use]
    pub const fn new() -> Self {
        Self { cache: None }
    }

    /// Replaces the cache hint.
    #[must_use]
    pub const fn with_cache(mut self, cache: Option<bool>) -> Self {
        self.cache = cache;
        self
    }

    /// Returns the cache hint.
    #[must_use]
    pub const fn cache(&self) -> Option<bool> {
        self.cache
    }
}

/// Turns a filename into a live plugin.
///
/// The production implementation is
/// [`ProcessLoader`](crate::process::ProcessLoader). Tests implement this
/// trait to hand out in-memory plugins and count loads.
pub trait PluginLoader: Send + Sync {
    /// Loads the plugin identified by `filename`.
    ///
    /// `client` is the editor connection the plugin may call back over; it is
    /// `None` until a session has been attached.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginError`] when no plugin can be produced for the
    /// filename.
    fn load(
        &self,
        filename: &str,
        client: Option<Arc<dyn RpcClient>>,
        options: &LoadOptions,
    ) -> Result<Arc<dyn Plugin>, PluginError>;
}

impl<L> PluginLoader for Arc<L>
where
    L: PluginLoader + ?Sized,
{
    fn load(
        &self,
        filename: &str,
        client: Option<Arc<dyn RpcClient>>,
        options: &LoadOptions,
    ) -> Result<Arc<dyn Plugin>, PluginError> {
        (**self).load(filename, client, options)
    }
}
