//! Test doubles shared by the host's unit and behavioural suites.

use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::{Arc, Mutex};

use ortho_config::{OrthoConfig, OrthoError};
use serde_json::{Value, json};

use bobbin_config::Config;
use bobbin_plugins::{
    LoadOptions, Plugin, PluginError, PluginLoader, PluginSpec, RpcClient, SpecKind,
};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::HealthReporter;
use crate::transport::TransportError;

/// What a stub plugin does when called.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Returns `{procedure, call_type, args}`.
    Echo,
    /// Returns nothing.
    Nothing,
    /// Fails with the given message.
    Fail(String),
    /// Calls the editor method named by the procedure and returns its answer.
    CallEditor,
}

/// Description of the plugin a [`StubLoader`] produces for a filename.
#[derive(Debug, Clone)]
pub struct PluginTemplate {
    pub specs: Vec<PluginSpec>,
    pub should_cache_module: bool,
    pub always_init: bool,
    pub behaviour: Behaviour,
}

impl PluginTemplate {
    /// A cacheable plugin declaring one function spec.
    pub fn cached(behaviour: Behaviour) -> Self {
        Self {
            specs: vec![PluginSpec::new(SpecKind::Function, "Hello").with_sync(true)],
            should_cache_module: true,
            always_init: false,
            behaviour,
        }
    }
}

struct StubPlugin {
    template: PluginTemplate,
    client: Option<Arc<dyn RpcClient>>,
}

impl Plugin for StubPlugin {
    fn handle_request(
        &self,
        procedure: &str,
        call_type: &str,
        args: &[Value],
    ) -> Result<Option<Value>, PluginError> {
        match &self.template.behaviour {
            Behaviour::Echo => Ok(Some(json!({
                "procedure": procedure,
                "call_type": call_type,
                "args": args,
            }))),
            Behaviour::Nothing => Ok(None),
            Behaviour::Fail(message) => Err(PluginError::handler("stub", message.as_str())),
            Behaviour::CallEditor => {
                let client = self
                    .client
                    .as_ref()
                    .ok_or_else(|| PluginError::handler("stub", "no editor client"))?;
                client
                    .request(procedure, args.to_vec())
                    .map(Some)
                    .map_err(|error| PluginError::handler("stub", error.to_string()))
            }
        }
    }

    fn specs(&self) -> &[PluginSpec] {
        &self.template.specs
    }

    fn should_cache_module(&self) -> bool {
        self.template.should_cache_module
    }

    fn always_init(&self) -> bool {
        self.template.always_init
    }
}

/// Loader serving in-memory plugins registered by filename.
#[derive(Default)]
pub struct StubLoader {
    templates: Mutex<HashMap<String, PluginTemplate>>,
    loads: Mutex<Vec<(String, bool)>>,
}

impl StubLoader {
    /// Registers the plugin produced for `filename`.
    pub fn register(&self, filename: &str, template: PluginTemplate) {
        self.templates
            .lock()
            .expect("templates lock")
            .insert(filename.to_owned(), template);
    }

    /// Builder-style variant of [`StubLoader::register`].
    pub fn with(self, filename: &str, template: PluginTemplate) -> Self {
        self.register(filename, template);
        self
    }

    /// Number of loads performed so far.
    pub fn load_count(&self) -> usize {
        self.loads.lock().expect("loads lock").len()
    }

    /// Whether each load so far received a session client.
    pub fn client_flags(&self) -> Vec<bool> {
        self.loads
            .lock()
            .expect("loads lock")
            .iter()
            .map(|(_, had_client)| *had_client)
            .collect()
    }
}

impl PluginLoader for StubLoader {
    fn load(
        &self,
        filename: &str,
        client: Option<Arc<dyn RpcClient>>,
        _options: &LoadOptions,
    ) -> Result<Arc<dyn Plugin>, PluginError> {
        self.loads
            .lock()
            .expect("loads lock")
            .push((filename.to_owned(), client.is_some()));
        let template = self
            .templates
            .lock()
            .expect("templates lock")
            .get(filename)
            .cloned()
            .ok_or_else(|| PluginError::NotFound {
                name: filename.to_owned(),
            })?;
        Ok(Arc::new(StubPlugin { template, client }))
    }
}

/// Lifecycle events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    SessionAttached,
    SessionDisconnected { clean: bool },
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn session_attached(&self) {
        self.record(HealthEvent::SessionAttached);
    }

    fn session_disconnected(&self, error: Option<&TransportError>) {
        self.record(HealthEvent::SessionDisconnected {
            clean: error.is_none(),
        });
    }
}

/// Loader that intentionally fails by passing an invalid CLI argument.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("bobbind"),
            OsString::from("--plugin-timeout-secs"),
            OsString::from("soon"),
        ];
        Config::load_from_iter(args)
    }
}

impl HealthEvent {
    /// Returns the event's name as written in feature files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BootstrapStarting => "bootstrap_starting",
            Self::BootstrapSucceeded => "bootstrap_succeeded",
            Self::BootstrapFailed(_) => "bootstrap_failed",
            Self::SessionAttached => "session_attached",
            Self::SessionDisconnected { .. } => "session_disconnected",
        }
    }
}
