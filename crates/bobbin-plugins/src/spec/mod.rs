//! Declarations a plugin exposes to the editor.
//!
//! The editor asks the host for a plugin's specs (via the `specs`
//! introspection call) and uses them to register commands, autocommands, and
//! functions that route back to the plugin. The serialised shape is fixed by
//! the editor's remote-plugin convention.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of editor entry point a plugin declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecKind {
    /// An ex command such as `:Hello`.
    Command,
    /// An autocommand handler.
    Autocmd,
    /// A function callable from editor script.
    Function,
}

impl SpecKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Autocmd => "autocmd",
            Self::Function => "function",
        }
    }
}

impl std::fmt::Display for SpecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry point declared by a plugin.
///
/// # Example
///
/// ```
/// use bobbin_plugins::{PluginSpec, SpecKind};
///
/// let spec = PluginSpec::new(SpecKind::Command, "Hello").with_sync(true);
/// let json = serde_json::to_value(&spec).expect("serialise");
/// assert_eq!(json["type"], "command");
/// assert_eq!(json["sync"], true);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
    #[serde(rename = "type")]
    kind: SpecKind,
    name: String,
    #[serde(default)]
    sync: bool,
    #[serde(default)]
    opts: Map<String, Value>,
}

impl PluginSpec {
    /// Creates an asynchronous spec with no options.
    #[must_use]
    pub fn new(kind: SpecKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            sync: false,
            opts: Map::new(),
        }
    }

    /// Marks whether the editor should wait for the call to complete.
    #[must_use]
    pub const fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Adds an option forwarded verbatim to the editor.
    #[must_use]
    pub fn with_opt(mut self, key: impl Into<String>, value: Value) -> Self {
        self.opts.insert(key.into(), value);
        self
    }

    /// Returns the entry point kind.
    #[must_use]
    pub const fn kind(&self) -> SpecKind {
        self.kind
    }

    /// Returns the entry point name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns whether the call is synchronous.
    #[must_use]
    pub const fn is_sync(&self) -> bool {
        self.sync
    }

    /// Returns the editor options.
    #[must_use]
    pub const fn opts(&self) -> &Map<String, Value> {
        &self.opts
    }
}
