//! Classification of inbound editor calls.

use serde_json::Value;

use super::method::{CompoundMethod, Platform};

/// Method the editor uses to check that the host is alive.
pub const HANDSHAKE_METHOD: &str = "poll";
/// Method the editor uses to ask for a plugin's declared specs.
pub const INTROSPECTION_METHOD: &str = "specs";
/// Prefix of editor API methods the host never routes to a plugin.
pub const RESERVED_PREFIX: &str = "nvim_";

/// What an inbound call asks the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCall {
    /// `poll`: answer `"ok"`.
    Handshake,
    /// `specs`: report the specs of the plugin named by the first argument.
    Introspection {
        /// Filename from the first argument, when it is a string.
        filename: Option<String>,
    },
    /// `nvim_*`: answer `null` without touching any plugin.
    Ignored,
    /// Route to a plugin procedure.
    Dispatch(CompoundMethod),
}

impl InboundCall {
    /// Classifies a request.
    #[must_use]
    pub fn classify_request(method: &str, args: &[Value], platform: Platform) -> Self {
        match method {
            HANDSHAKE_METHOD => Self::Handshake,
            INTROSPECTION_METHOD => Self::Introspection {
                filename: args.first().and_then(Value::as_str).map(str::to_owned),
            },
            _ => Self::classify_notification(method, platform),
        }
    }

    /// Classifies a notification. Notifications are never handshakes or
    /// introspection.
    #[must_use]
    pub fn classify_notification(method: &str, platform: Platform) -> Self {
        if method.starts_with(RESERVED_PREFIX) {
            Self::Ignored
        } else {
            Self::Dispatch(CompoundMethod::parse(method, platform))
        }
    }
}
