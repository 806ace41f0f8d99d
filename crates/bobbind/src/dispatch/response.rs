//! Reply values and the sink contract used to deliver them.

use std::sync::mpsc;

use serde_json::Value;

/// Outcome of a request, sent back to the editor exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The call succeeded with this value.
    Success(Value),
    /// The call failed with this message.
    Error(String),
}

impl Reply {
    /// Returns true for [`Reply::Error`].
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Splits the reply into the `(error, result)` pair carried on the wire,
    /// with `null` standing in for the absent half.
    #[must_use]
    pub fn into_wire(self) -> (Value, Value) {
        match self {
            Self::Success(value) => (Value::Null, value),
            Self::Error(message) => (Value::String(message), Value::Null),
        }
    }
}

/// Destination for the single reply to a request.
///
/// `send` consumes the sink, so a request can be answered at most once.
pub trait ResponseSink: Send {
    /// Delivers `reply` to the caller.
    fn send(self: Box<Self>, reply: Reply);
}

impl ResponseSink for mpsc::Sender<Reply> {
    fn send(self: Box<Self>, reply: Reply) {
        // The receiver going away means nobody is waiting for the reply.
        drop(mpsc::Sender::send(&self, reply));
    }
}
