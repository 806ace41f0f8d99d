//! Host bootstrap orchestration.

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use bobbin_config::Config;
use bobbin_plugins::{PluginLoader, ProcessLoader};

use crate::dispatch::Dispatcher;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{Session, TransportError};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the host configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`], or to
/// [`Config::load_from_iter`] when an explicit command line is supplied.
#[derive(Debug, Default, Clone)]
pub struct SystemConfigLoader {
    args: Option<Vec<OsString>>,
}

impl SystemConfigLoader {
    /// Reads the process command line, environment and configuration files.
    #[must_use]
    pub const fn new() -> Self {
        Self { args: None }
    }

    /// Reads the given command line in place of the process arguments.
    ///
    /// The first item is the program name, as with [`std::env::args_os`].
    #[must_use]
    pub fn with_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self {
            args: Some(args.into_iter().map(Into::into).collect()),
        }
    }
}

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        match &self.args {
            Some(args) => Config::load_from_iter(args.clone()),
            None => Config::load(),
        }
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Host {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Host {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Builds the process plugin loader described by the configuration.
    #[must_use]
    pub fn loader(&self) -> ProcessLoader {
        let loader = ProcessLoader::new(self.config.plugin_timeout());
        match self.config.plugin_runner() {
            Some(runner) => loader.with_runner(runner),
            None => loader,
        }
    }

    /// Builds a dispatcher with an empty plugin cache.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher<ProcessLoader> {
        Dispatcher::new(self.loader())
    }

    /// Serves one editor session over `reader` and `writer` until the editor
    /// disconnects.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when reading from the editor fails.
    pub fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), TransportError>
    where
        R: BufRead,
        W: Write + Send + 'static,
    {
        self.serve_with(Arc::new(self.dispatcher()), reader, writer)
    }

    /// Serves one editor session through an existing dispatcher.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when reading from the editor fails.
    pub fn serve_with<L, R, W>(
        &self,
        dispatcher: Arc<Dispatcher<L>>,
        reader: R,
        writer: W,
    ) -> Result<(), TransportError>
    where
        L: PluginLoader + 'static,
        R: BufRead,
        W: Write + Send + 'static,
    {
        let (session, client) = Session::new(reader, writer);
        dispatcher.attach(Arc::new(client));
        self.reporter.session_attached();

        let outcome = session.run(dispatcher);
        self.reporter.session_disconnected(outcome.as_ref().err());
        outcome
    }
}

/// Bootstraps the host using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] when configuration cannot be loaded or
/// telemetry cannot be installed. The reporter sees the failure first.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Host, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Host {
        config,
        telemetry,
        reporter,
    })
}
