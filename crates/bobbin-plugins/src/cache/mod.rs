//! Plugin cache and resolution policy.
//!
//! The [`PluginCache`] owns the mapping from filename to the current plugin
//! instance. [`PluginCache::resolve`] is its only mutator: it hands back the
//! cached instance when the plugin allows reuse, and otherwise asks the
//! [`PluginLoader`] for a fresh instance and stores it in place of the old one.
//!
//! The map lock is never held across a loader call. Two threads reloading the
//! same filename at once both load, and whichever stores last becomes current.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::client::RpcClient;
use crate::loader::{LoadOptions, PluginLoader};
use crate::plugin::Plugin;

/// Tracing target for cache operations.
const CACHE_TARGET: &str = "bobbin_plugins::cache";

/// Process-lifetime cache of loaded plugins keyed by filename.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use bobbin_plugins::{
///     LoadOptions, Plugin, PluginCache, PluginError, PluginLoader, PluginSpec, RpcClient,
/// };
/// use serde_json::Value;
///
/// struct Inert;
///
/// impl Plugin for Inert {
///     fn handle_request(&self, _: &str, _: &str, _: &[Value]) -> Result<Option<Value>, PluginError> {
///         Ok(None)
///     }
///     fn specs(&self) -> &[PluginSpec] {
///         &[]
///     }
///     fn should_cache_module(&self) -> bool {
///         true
///     }
///     fn always_init(&self) -> bool {
///         false
///     }
/// }
///
/// struct InertLoader;
///
/// impl PluginLoader for InertLoader {
///     fn load(
///         &self,
///         _filename: &str,
///         _client: Option<Arc<dyn RpcClient>>,
///         _options: &LoadOptions,
///     ) -> Result<Arc<dyn Plugin>, PluginError> {
///         Ok(Arc::new(Inert))
///     }
/// }
///
/// let cache = PluginCache::new(InertLoader);
/// let first = cache.resolve("inert", None, &LoadOptions::new()).expect("first load");
/// let second = cache.resolve("inert", None, &LoadOptions::new()).expect("cached");
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct PluginCache<L> {
    loader: L,
    loaded: Mutex<HashMap<String, Arc<dyn Plugin>>>,
}

impl<L> PluginCache<L> {
    /// Creates an empty cache backed by `loader`.
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the loader backing this cache.
    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Returns the number of cached plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` when nothing has been loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Returns `true` when a current instance exists for `filename`.
    #[must_use]
    pub fn contains(&self, filename: &str) -> bool {
        self.entries().contains_key(filename)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn Plugin>>> {
        // Plugin and loader code never runs under this lock, so a poisoned
        // guard still holds a consistent map.
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, filename: &str) -> Option<Arc<dyn Plugin>> {
        self.entries().get(filename).map(Arc::clone)
    }
}

impl<L: PluginLoader> PluginCache<L> {
    /// Resolves `filename` to its current plugin instance.
    ///
    /// A cached instance is returned unchanged when it reports
    /// `should_cache_module() == true` and `always_init() == false`.
    /// Otherwise the loader is invoked with `options` whose cache hint is the
    /// previous instance's `should_cache_module()` flag (`None` on first
    /// load), and the result replaces the cached entry.
    ///
    /// Returns `None` when the loader fails; the failure is logged and the
    /// filename no longer has a current instance.
    pub fn resolve(
        &self,
        filename: &str,
        client: Option<Arc<dyn RpcClient>>,
        options: &LoadOptions,
    ) -> Option<Arc<dyn Plugin>> {
        let previous = self.cached(filename);

        if let Some(plugin) = previous.as_ref().filter(|plugin| is_reusable(plugin.as_ref())) {
            debug!(target: CACHE_TARGET, filename, "using cached plugin");
            return Some(Arc::clone(plugin));
        }

        let cache_hint = previous.map(|plugin| plugin.should_cache_module());
        let load_options = options.with_cache(cache_hint);

        match self.loader.load(filename, client, &load_options) {
            Ok(plugin) => {
                debug!(
                    target: CACHE_TARGET,
                    filename,
                    cache_hint = ?cache_hint,
                    should_cache_module = plugin.should_cache_module(),
                    always_init = plugin.always_init(),
                    "loaded plugin"
                );
                self.entries()
                    .insert(filename.to_owned(), Arc::clone(&plugin));
                Some(plugin)
            }
            Err(error) => {
                warn!(target: CACHE_TARGET, filename, %error, "plugin failed to load");
                self.entries().remove(filename);
                None
            }
        }
    }
}

impl<L> fmt::Debug for PluginCache<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filenames: Vec<String> = self.entries().keys().cloned().collect();
        filenames.sort_unstable();
        f.debug_struct("PluginCache")
            .field("loaded", &filenames)
            .finish_non_exhaustive()
    }
}

fn is_reusable(plugin: &dyn Plugin) -> bool {
    plugin.should_cache_module() && !plugin.always_init()
}
