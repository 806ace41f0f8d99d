//! Outbound calls from the host to the editor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};

use serde_json::Value;
use tracing::debug;

use bobbin_plugins::{RpcClient, RpcError};

use super::TRANSPORT_TARGET;
use super::message::Message;
use super::writer::FrameWriter;

type Completion = mpsc::Sender<Result<Value, RpcError>>;

#[derive(Default)]
struct PendingState {
    calls: HashMap<u64, Completion>,
    closed: bool,
}

/// Calls awaiting a response frame, keyed by msgid.
#[derive(Default)]
pub(crate) struct PendingCalls {
    state: Mutex<PendingState>,
}

impl PendingCalls {
    fn state(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, msgid: u64) -> Result<mpsc::Receiver<Result<Value, RpcError>>, RpcError> {
        let mut state = self.state();
        if state.closed {
            return Err(RpcError::Disconnected);
        }
        let (sender, receiver) = mpsc::channel();
        state.calls.insert(msgid, sender);
        Ok(receiver)
    }

    fn forget(&self, msgid: u64) {
        self.state().calls.remove(&msgid);
    }

    /// Completes the call waiting on `msgid`. Returns false when no call was
    /// waiting.
    pub(crate) fn complete(&self, msgid: u64, outcome: Result<Value, RpcError>) -> bool {
        let Some(waiter) = self.state().calls.remove(&msgid) else {
            return false;
        };
        drop(waiter.send(outcome));
        true
    }

    /// Fails every waiting call with [`RpcError::Disconnected`] and refuses
    /// new ones.
    pub(crate) fn close(&self) -> usize {
        let mut state = self.state();
        state.closed = true;
        let waiters: Vec<Completion> = state.calls.drain().map(|(_, waiter)| waiter).collect();
        drop(state);
        let failed = waiters.len();
        for waiter in waiters {
            drop(waiter.send(Err(RpcError::Disconnected)));
        }
        failed
    }
}

/// [`RpcClient`] that issues calls over an attached [`Session`](super::Session).
#[derive(Clone)]
pub struct SessionClient {
    writer: Arc<FrameWriter>,
    pending: Arc<PendingCalls>,
    next_msgid: Arc<AtomicU64>,
}

impl SessionClient {
    pub(crate) fn new(writer: Arc<FrameWriter>, pending: Arc<PendingCalls>) -> Self {
        Self {
            writer,
            pending,
            next_msgid: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl RpcClient for SessionClient {
    fn request(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
        let msgid = self.next_msgid.fetch_add(1, Ordering::Relaxed);
        let receiver = self.pending.register(msgid)?;
        let message = Message::Request {
            msgid,
            method: method.to_owned(),
            params: args,
        };
        if let Err(error) = self.writer.write(&message) {
            self.pending.forget(msgid);
            return Err(RpcError::transport(error));
        }
        debug!(target: TRANSPORT_TARGET, msgid, method, "awaiting editor response");
        receiver.recv().unwrap_or(Err(RpcError::Disconnected))
    }

    fn notify(&self, method: &str, args: Vec<Value>) -> Result<(), RpcError> {
        let message = Message::Notification {
            method: method.to_owned(),
            params: args,
        };
        self.writer.write(&message).map_err(RpcError::transport)
    }
}

/// Maps the error element of a response frame to an [`RpcError`].
///
/// The editor reports errors either as a plain string or as a
/// `[type, message]` pair.
pub(crate) fn remote_error(error: Value) -> RpcError {
    let message = match error {
        Value::String(message) => message,
        Value::Array(parts) => match parts.get(1) {
            Some(Value::String(message)) => message.clone(),
            _ => Value::Array(parts).to_string(),
        },
        other => other.to_string(),
    };
    RpcError::Remote { message }
}
