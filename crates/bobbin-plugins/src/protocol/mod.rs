//! JSONL protocol spoken between the host and process-backed plugins.
//!
//! Every exchange is a single line each way. The host writes one
//! [`HostRequest`] line to the plugin's stdin and closes it. The plugin
//! writes one [`PluginReply`] line to stdout and exits. Plugin stderr is
//! captured for diagnostic logging but is not part of the protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::PluginSpec;

/// Request sent from the host to a plugin process on stdin.
///
/// # Example
///
/// ```
/// use bobbin_plugins::protocol::HostRequest;
///
/// let request = HostRequest::describe(Some(true));
/// let line = serde_json::to_string(&request).expect("serialise");
/// assert_eq!(line, r#"{"kind":"describe","cache":true}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostRequest {
    /// Asks the plugin for its declared specs and caching flags.
    Describe {
        /// Whether the previous instance allowed caching, when one existed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache: Option<bool>,
    },
    /// Routes one editor call to the plugin.
    Invoke {
        /// Procedure name as parsed from the compound method.
        procedure: String,
        /// Call type as parsed from the compound method.
        call_type: String,
        /// Arguments supplied by the editor.
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl HostRequest {
    /// Creates a describe request carrying the loader's cache hint.
    #[must_use]
    pub const fn describe(cache: Option<bool>) -> Self {
        Self::Describe { cache }
    }

    /// Creates an invoke request.
    #[must_use]
    pub fn invoke(
        procedure: impl Into<String>,
        call_type: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Self::Invoke {
            procedure: procedure.into(),
            call_type: call_type.into(),
            args,
        }
    }

    /// Returns the reply kind expected in answer to this request.
    #[must_use]
    pub const fn expected_reply(&self) -> &'static str {
        match self {
            Self::Describe { .. } => "describe",
            Self::Invoke { .. } => "result",
        }
    }
}

/// Reply written by a plugin process on stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PluginReply {
    /// Answer to [`HostRequest::Describe`].
    Describe {
        /// Entry points the plugin declares.
        #[serde(default)]
        specs: Vec<PluginSpec>,
        /// Whether the host may reuse this plugin's description.
        #[serde(default = "default_should_cache_module")]
        should_cache_module: bool,
        /// Whether the host must reload the plugin on every resolution.
        #[serde(default)]
        always_init: bool,
    },
    /// Successful answer to [`HostRequest::Invoke`].
    Result {
        /// Value returned to the editor; absent means no value.
        #[serde(default)]
        value: Option<Value>,
        /// Notifications the host forwards to the editor on the plugin's
        /// behalf.
        #[serde(default)]
        notifications: Vec<EditorNotification>,
    },
    /// Failed answer to [`HostRequest::Invoke`].
    Error {
        /// Failure text surfaced to the editor.
        message: String,
    },
}

impl PluginReply {
    /// Returns the wire name of the reply kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Describe { .. } => "describe",
            Self::Result { .. } => "result",
            Self::Error { .. } => "error",
        }
    }
}

const fn default_should_cache_module() -> bool {
    true
}

/// A notification a plugin asks the host to send to the editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorNotification {
    method: String,
    #[serde(default)]
    args: Vec<Value>,
}

impl EditorNotification {
    /// Creates a notification for `method` with `args`.
    #[must_use]
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Returns the editor method name.
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the notification arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Splits the notification into its method and arguments.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.method, self.args)
    }
}
