//! Routing of editor calls to plugins.
//!
//! [`Dispatcher`] classifies each inbound call, resolves the target plugin
//! through its [`PluginCache`], invokes it, and shapes the outcome into a
//! [`Reply`]. Errors on the request path never escape: they become error
//! replies so one failing plugin cannot tear down the session.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

use bobbin_plugins::{LoadOptions, Plugin, PluginCache, PluginLoader, RpcClient};

use super::DISPATCH_TARGET;
use super::call::InboundCall;
use super::errors::DispatchError;
use super::method::{CompoundMethod, Platform};
use super::response::{Reply, ResponseSink};

const HANDSHAKE_REPLY: &str = "ok";

/// Routes editor calls to plugins loaded through `L`.
pub struct Dispatcher<L> {
    cache: PluginCache<L>,
    client: RwLock<Option<Arc<dyn RpcClient>>>,
    platform: Platform,
}

impl<L> Dispatcher<L> {
    /// Creates a dispatcher for the current platform with an empty cache.
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self::with_platform(loader, Platform::current())
    }

    /// Creates a dispatcher that parses methods as on `platform`.
    #[must_use]
    pub fn with_platform(loader: L, platform: Platform) -> Self {
        Self {
            cache: PluginCache::new(loader),
            client: RwLock::new(None),
            platform,
        }
    }

    /// Returns the plugin cache.
    #[must_use]
    pub const fn cache(&self) -> &PluginCache<L> {
        &self.cache
    }

    /// Returns the platform used when parsing methods.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Stores the session client handed to plugins loaded from now on.
    pub fn attach(&self, client: Arc<dyn RpcClient>) {
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = Some(client);
        debug!(target: DISPATCH_TARGET, "session client attached");
    }

    /// Returns the attached session client, if any.
    #[must_use]
    pub fn client(&self) -> Option<Arc<dyn RpcClient>> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<L: PluginLoader> Dispatcher<L> {
    /// Answers a request through `sink`. Exactly one reply is sent.
    pub fn handle_request(&self, method: &str, args: &[Value], sink: Box<dyn ResponseSink>) {
        let reply = match self.respond(method, args) {
            Ok(value) => Reply::Success(value),
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    method,
                    %error,
                    "request failed"
                );
                Reply::Error(error.to_string())
            }
        };
        sink.send(reply);
    }

    /// Runs a notification. Notifications have no reply, so failures are
    /// returned for the caller to log.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the plugin cannot be loaded or fails.
    pub fn handle_notification(&self, method: &str, args: &[Value]) -> Result<(), DispatchError> {
        match InboundCall::classify_notification(method, self.platform) {
            InboundCall::Dispatch(compound) => self.handle_plugin(&compound, args).map(drop),
            _ => Ok(()),
        }
    }

    fn respond(&self, method: &str, args: &[Value]) -> Result<Value, DispatchError> {
        match InboundCall::classify_request(method, args, self.platform) {
            InboundCall::Handshake => Ok(Value::from(HANDSHAKE_REPLY)),
            InboundCall::Introspection { filename } => Ok(self.request_specs(filename.as_deref())),
            InboundCall::Ignored => Ok(Value::Null),
            InboundCall::Dispatch(compound) => self
                .handle_plugin(&compound, args)
                .map(Option::unwrap_or_default),
        }
    }

    /// Returns the declared specs of `filename` as a JSON array, or an empty
    /// array when the plugin cannot be resolved.
    fn request_specs(&self, filename: Option<&str>) -> Value {
        let Some(plugin) = filename.and_then(|filename| self.resolve(filename)) else {
            return Value::Array(Vec::new());
        };
        // Specs are plain data; serialising them cannot fail.
        serde_json::to_value(plugin.specs()).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    fn handle_plugin(
        &self,
        compound: &CompoundMethod,
        args: &[Value],
    ) -> Result<Option<Value>, DispatchError> {
        let plugin = self
            .resolve(compound.filename())
            .ok_or_else(|| DispatchError::plugin_not_found(compound.filename()))?;
        debug!(
            target: DISPATCH_TARGET,
            filename = compound.filename(),
            call_type = compound.call_type(),
            procedure = compound.procedure(),
            "dispatching to plugin"
        );
        plugin
            .handle_request(compound.procedure(), compound.call_type(), args)
            .map_err(DispatchError::from)
    }

    fn resolve(&self, filename: &str) -> Option<Arc<dyn Plugin>> {
        self.cache
            .resolve(filename, self.client(), &LoadOptions::new())
    }
}

impl<L> fmt::Debug for Dispatcher<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("cache", &self.cache)
            .field("platform", &self.platform)
            .field("client_attached", &self.client().is_some())
            .finish()
    }
}
