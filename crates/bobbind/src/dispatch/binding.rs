//! Binds the dispatcher to session transport events.

use serde_json::Value;
use tracing::{error, info};

use bobbin_plugins::PluginLoader;

use crate::transport::SessionHandler;

use super::DISPATCH_TARGET;
use super::handler::Dispatcher;
use super::response::ResponseSink;

impl<L> SessionHandler for Dispatcher<L>
where
    L: PluginLoader + 'static,
{
    fn on_request(&self, method: &str, args: Vec<Value>, sink: Box<dyn ResponseSink>) {
        self.handle_request(method, &args, sink);
    }

    fn on_notification(&self, method: &str, args: Vec<Value>) {
        if let Err(err) = self.handle_notification(method, &args) {
            error!(
                target: DISPATCH_TARGET,
                method,
                error = %err,
                "notification failed"
            );
        }
    }

    fn on_disconnect(&self) {
        info!(
            target: DISPATCH_TARGET,
            cached_plugins = self.cache().len(),
            "editor session disconnected"
        );
    }
}
