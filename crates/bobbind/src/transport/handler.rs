//! Session event handling abstraction.

use serde_json::Value;

use crate::dispatch::ResponseSink;

/// Receives the events of one editor session.
///
/// Requests and notifications arrive on their own threads, so several calls
/// may be in flight at once.
pub trait SessionHandler: Send + Sync + 'static {
    /// Handles a request. The handler must answer through `sink` exactly once.
    fn on_request(&self, method: &str, args: Vec<Value>, sink: Box<dyn ResponseSink>);

    /// Handles a notification, which has no reply.
    fn on_notification(&self, method: &str, args: Vec<Value>);

    /// Called once after the editor has closed the session.
    fn on_disconnect(&self);
}
