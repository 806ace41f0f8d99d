//! Session frames and their JSON encoding.

use serde_json::{Value, json};

use crate::dispatch::Reply;

use super::errors::TransportError;

/// Discriminant carried in the first element of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
    Notification,
}

impl MessageKind {
    const fn code(self) -> u64 {
        match self {
            Self::Request => 0,
            Self::Response => 1,
            Self::Notification => 2,
        }
    }

    fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Request),
            1 => Some(Self::Response),
            2 => Some(Self::Notification),
            _ => None,
        }
    }
}

/// One decoded session frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `[0, msgid, method, params]`
    Request {
        msgid: u64,
        method: String,
        params: Vec<Value>,
    },
    /// `[1, msgid, error, result]`
    Response {
        msgid: u64,
        error: Value,
        result: Value,
    },
    /// `[2, method, params]`
    Notification { method: String, params: Vec<Value> },
}

impl Message {
    /// Builds the response frame answering request `msgid`.
    #[must_use]
    pub fn reply(msgid: u64, reply: Reply) -> Self {
        let (error, result) = reply.into_wire();
        Self::Response {
            msgid,
            error,
            result,
        }
    }

    /// Returns the frame's kind.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Request { .. } => MessageKind::Request,
            Self::Response { .. } => MessageKind::Response,
            Self::Notification { .. } => MessageKind::Notification,
        }
    }

    /// Decodes one frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MalformedFrame`] when `line` is not a JSON
    /// array of one of the three frame shapes.
    pub fn decode(line: &[u8]) -> Result<Self, TransportError> {
        let value: Value = serde_json::from_slice(line)
            .map_err(|error| TransportError::malformed(format!("invalid JSON: {error}")))?;
        let Value::Array(items) = value else {
            return Err(TransportError::malformed("frame is not an array"));
        };
        let mut fields = items.into_iter();
        let code = fields
            .next()
            .as_ref()
            .and_then(Value::as_u64)
            .ok_or_else(|| TransportError::malformed("missing message type"))?;
        let kind = MessageKind::from_code(code)
            .ok_or_else(|| TransportError::malformed(format!("unknown message type {code}")))?;

        let message = match kind {
            MessageKind::Request => Self::Request {
                msgid: next_msgid(&mut fields)?,
                method: next_method(&mut fields)?,
                params: next_params(&mut fields)?,
            },
            MessageKind::Response => Self::Response {
                msgid: next_msgid(&mut fields)?,
                error: fields.next().unwrap_or(Value::Null),
                result: fields.next().unwrap_or(Value::Null),
            },
            MessageKind::Notification => Self::Notification {
                method: next_method(&mut fields)?,
                params: next_params(&mut fields)?,
            },
        };

        if fields.next().is_some() {
            return Err(TransportError::malformed("trailing frame elements"));
        }
        Ok(message)
    }

    /// Encodes the frame as a single JSON line without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Serialize`] when serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, TransportError> {
        let code = self.kind().code();
        let value = match self {
            Self::Request {
                msgid,
                method,
                params,
            } => json!([code, msgid, method, params]),
            Self::Response {
                msgid,
                error,
                result,
            } => json!([code, msgid, error, result]),
            Self::Notification { method, params } => json!([code, method, params]),
        };
        serde_json::to_vec(&value).map_err(TransportError::Serialize)
    }
}

fn next_msgid(fields: &mut impl Iterator<Item = Value>) -> Result<u64, TransportError> {
    fields
        .next()
        .as_ref()
        .and_then(Value::as_u64)
        .ok_or_else(|| TransportError::malformed("msgid must be a non-negative integer"))
}

fn next_method(fields: &mut impl Iterator<Item = Value>) -> Result<String, TransportError> {
    match fields.next() {
        Some(Value::String(method)) => Ok(method),
        _ => Err(TransportError::malformed("method must be a string")),
    }
}

fn next_params(fields: &mut impl Iterator<Item = Value>) -> Result<Vec<Value>, TransportError> {
    match fields.next() {
        Some(Value::Array(params)) => Ok(params),
        _ => Err(TransportError::malformed("params must be an array")),
    }
}
