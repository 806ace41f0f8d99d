//! Plugin contracts and loading for the bobbin plugin host.
//!
//! The `bobbin-plugins` crate defines what a remote plugin is to the host and
//! how the host obtains one. A [`Plugin`] answers editor calls routed to it
//! and declares its entry points as [`PluginSpec`] values. A
//! [`PluginLoader`] turns a filename into a live plugin, and the
//! [`PluginCache`] decides, per resolution, whether the current instance may
//! be reused or a fresh one must be loaded.
//!
//! # Architecture
//!
//! The production loader is [`ProcessLoader`]. It treats each plugin file as
//! a short-lived program that speaks a single-line JSONL protocol over
//! standard I/O ([`protocol`]). Plugins call back into the editor through the
//! [`RpcClient`] of the session that was attached when they were loaded.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use bobbin_plugins::{LoadOptions, PluginCache, ProcessLoader};
//!
//! let cache = PluginCache::new(ProcessLoader::new(Duration::from_secs(30)));
//! if let Some(plugin) = cache.resolve("/plugins/hello.sh", None, &LoadOptions::new()) {
//!     let _value = plugin.handle_request("Hello", "function", &[]);
//! }
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod loader;
pub mod plugin;
pub mod process;
pub mod protocol;
pub mod spec;

#[cfg(test)]
mod tests;

pub use self::cache::PluginCache;
pub use self::client::{RpcClient, RpcError};
pub use self::error::PluginError;
pub use self::loader::{LoadOptions, PluginLoader};
pub use self::plugin::Plugin;
pub use self::process::{PluginCommand, ProcessLoader, ProcessPlugin};
pub use self::protocol::{EditorNotification, HostRequest, PluginReply};
pub use self::spec::{PluginSpec, SpecKind};
