//! Crate-level test doubles and BDD tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::client::RpcClient;
use crate::error::PluginError;
use crate::loader::{LoadOptions, PluginLoader};
use crate::plugin::Plugin;
use crate::spec::PluginSpec;


/// In-memory plugin with fixed policy flags.
#[derive(Debug, Default)]
pub(crate) struct StubPlugin {
    pub(crate) specs: Vec<PluginSpec>,
    pub(crate) should_cache_module: bool,
    pub(crate) always_init: bool,
}

impl StubPlugin {
    pub(crate) fn cached() -> Self {
        Self {
            should_cache_module: true,
            ..Self::default()
        }
    }

    pub(crate) fn uncached() -> Self {
        Self::default()
    }

    pub(crate) fn always_init() -> Self {
        Self {
            should_cache_module: true,
            always_init: true,
            ..Self::default()
        }
    }
}

impl Plugin for StubPlugin {
    fn handle_request(
        &self,
        procedure: &str,
        _call_type: &str,
        _args: &[Value],
    ) -> Result<Option<Value>, PluginError> {
        Ok(Some(Value::from(procedure)))
    }

    fn specs(&self) -> &[PluginSpec] {
        &self.specs
    }

    fn should_cache_module(&self) -> bool {
        self.should_cache_module
    }

    fn always_init(&self) -> bool {
        self.always_init
    }
}

/// What a [`ScriptedLoader`] should do on its next load.
pub(crate) enum Outcome {
    Load(fn() -> StubPlugin),
    Fail,
}

/// A single recorded loader invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadRecord {
    pub(crate) filename: String,
    pub(crate) cache: Option<bool>,
    pub(crate) had_client: bool,
}

/// Loader that replays scripted outcomes and records every call.
///
/// Once the script is exhausted the last outcome repeats.
pub(crate) struct ScriptedLoader {
    script: Mutex<VecDeque<Outcome>>,
    fallback: fn() -> StubPlugin,
    records: Mutex<Vec<LoadRecord>>,
}

impl ScriptedLoader {
    pub(crate) fn always(make: fn() -> StubPlugin) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: make,
            records: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn scripted(outcomes: Vec<Outcome>, fallback: fn() -> StubPlugin) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            fallback,
            records: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn records(&self) -> Vec<LoadRecord> {
        self.records.lock().expect("records lock").clone()
    }

    pub(crate) fn load_count(&self) -> usize {
        self.records.lock().expect("records lock").len()
    }
}

impl PluginLoader for ScriptedLoader {
    fn load(
        &self,
        filename: &str,
        client: Option<Arc<dyn RpcClient>>,
        options: &LoadOptions,
    ) -> Result<Arc<dyn Plugin>, PluginError> {
        self.records.lock().expect("records lock").push(LoadRecord {
            filename: filename.to_owned(),
            cache: options.cache(),
            had_client: client.is_some(),
        });
        let next = self.script.lock().expect("script lock").pop_front();
        match next {
            Some(Outcome::Fail) => Err(PluginError::NotFound {
                name: filename.to_owned(),
            }),
            Some(Outcome::Load(make)) => Ok(Arc::new(make())),
            None => Ok(Arc::new((self.fallback)())),
        }
    }
}

/// Client that accepts every call and replies with `null`.
pub(crate) struct NullClient;

impl RpcClient for NullClient {
    fn request(&self, _method: &str, _args: Vec<Value>) -> Result<Value, crate::RpcError> {
        Ok(Value::Null)
    }

    fn notify(&self, _method: &str, _args: Vec<Value>) -> Result<(), crate::RpcError> {
        Ok(())
    }
}
