//! Process-backed plugins.
//!
//! [`ProcessLoader`] treats a plugin filename as a program speaking the JSONL
//! protocol in [`crate::protocol`]. Every exchange spawns a fresh child
//! process, writes one request line to its stdin, reads one reply line from
//! its stdout, and waits for the child to exit. The whole exchange is bounded
//! by the loader's timeout.

use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::RpcClient;
use crate::error::PluginError;
use crate::loader::{LoadOptions, PluginLoader};
use crate::plugin::Plugin;
use crate::protocol::{EditorNotification, HostRequest, PluginReply};
use crate::spec::PluginSpec;

/// Tracing target for plugin process operations.
const PLUGIN_TARGET: &str = "bobbin_plugins::process";

/// Program and arguments used to launch one plugin file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCommand {
    program: PathBuf,
    args: Vec<PathBuf>,
}

impl PluginCommand {
    /// Builds the launch command for `path`.
    ///
    /// With a runner such as `"python3 -u"`, the runner's words form the
    /// program and leading arguments and `path` is appended last. Without a
    /// runner the plugin file is executed directly.
    #[must_use]
    pub fn for_plugin(runner: Option<&str>, path: &Path) -> Self {
        let mut words = runner.into_iter().flat_map(str::split_whitespace);
        match words.next() {
            Some(program) => {
                let mut args: Vec<PathBuf> = words.map(PathBuf::from).collect();
                args.push(path.to_path_buf());
                Self {
                    program: PathBuf::from(program),
                    args,
                }
            }
            None => Self {
                program: path.to_path_buf(),
                args: Vec::new(),
            },
        }
    }

    /// Returns the program that is spawned.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns the arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[PathBuf] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

/// Loads plugins by describing plugin programs over stdio.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use bobbin_plugins::{LoadOptions, PluginLoader, ProcessLoader};
///
/// let loader = ProcessLoader::new(Duration::from_secs(30)).with_runner("python3");
/// let plugin = loader.load("/plugins/hello.py", None, &LoadOptions::new());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLoader {
    runner: Option<String>,
    timeout: Duration,
}

impl ProcessLoader {
    /// Creates a loader that executes plugin files directly.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            runner: None,
            timeout,
        }
    }

    /// Launches plugin files through `runner`.
    #[must_use]
    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = Some(runner.into());
        self
    }

    /// Returns the configured runner, if any.
    #[must_use]
    pub fn runner(&self) -> Option<&str> {
        self.runner.as_deref()
    }

    /// Returns the per-exchange timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl PluginLoader for ProcessLoader {
    fn load(
        &self,
        filename: &str,
        client: Option<Arc<dyn RpcClient>>,
        options: &LoadOptions,
    ) -> Result<Arc<dyn Plugin>, PluginError> {
        let path = PathBuf::from(filename);
        if !path.is_file() {
            return Err(PluginError::ExecutableNotFound {
                name: filename.to_owned(),
                path,
            });
        }

        let command = PluginCommand::for_plugin(self.runner(), &path);
        let request = HostRequest::describe(options.cache());
        let reply = exchange(filename, &command, &request, self.timeout)?;

        match reply {
            PluginReply::Describe {
                specs,
                should_cache_module,
                always_init,
            } => {
                debug!(
                    target: PLUGIN_TARGET,
                    plugin = filename,
                    specs = specs.len(),
                    should_cache_module,
                    always_init,
                    "described plugin"
                );
                Ok(Arc::new(ProcessPlugin {
                    name: filename.to_owned(),
                    command,
                    timeout: self.timeout,
                    specs,
                    should_cache_module,
                    always_init,
                    client,
                }))
            }
            PluginReply::Error { message } => Err(PluginError::handler(filename, message)),
            other @ PluginReply::Result { .. } => Err(PluginError::UnexpectedReply {
                name: filename.to_owned(),
                expected: request.expected_reply(),
                received: other.kind(),
            }),
        }
    }
}

/// A described plugin program; each call is a fresh invoke exchange.
pub struct ProcessPlugin {
    name: String,
    command: PluginCommand,
    timeout: Duration,
    specs: Vec<PluginSpec>,
    should_cache_module: bool,
    always_init: bool,
    client: Option<Arc<dyn RpcClient>>,
}

impl ProcessPlugin {
    /// Returns the plugin filename.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the command used to launch the plugin.
    #[must_use]
    pub const fn command(&self) -> &PluginCommand {
        &self.command
    }

    fn forward(&self, notifications: Vec<EditorNotification>) {
        if notifications.is_empty() {
            return;
        }
        let Some(client) = self.client.as_ref() else {
            warn!(
                target: PLUGIN_TARGET,
                plugin = self.name.as_str(),
                dropped = notifications.len(),
                "no editor session attached, dropping plugin notifications"
            );
            return;
        };
        for notification in notifications {
            let (method, args) = notification.into_parts();
            if let Err(error) = client.notify(&method, args) {
                warn!(
                    target: PLUGIN_TARGET,
                    plugin = self.name.as_str(),
                    method = method.as_str(),
                    %error,
                    "failed to forward plugin notification"
                );
            }
        }
    }
}

impl fmt::Debug for ProcessPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessPlugin")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("timeout", &self.timeout)
            .field("specs", &self.specs)
            .field("should_cache_module", &self.should_cache_module)
            .field("always_init", &self.always_init)
            .field("client_attached", &self.client.is_some())
            .finish()
    }
}

impl Plugin for ProcessPlugin {
    fn handle_request(
        &self,
        procedure: &str,
        call_type: &str,
        args: &[Value],
    ) -> Result<Option<Value>, PluginError> {
        let request = HostRequest::invoke(procedure, call_type, args.to_vec());
        match exchange(&self.name, &self.command, &request, self.timeout)? {
            PluginReply::Result {
                value,
                notifications,
            } => {
                self.forward(notifications);
                Ok(value)
            }
            PluginReply::Error { message } => Err(PluginError::handler(&self.name, message)),
            other @ PluginReply::Describe { .. } => Err(PluginError::UnexpectedReply {
                name: self.name.clone(),
                expected: request.expected_reply(),
                received: other.kind(),
            }),
        }
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

/// Runs one request/reply exchange with a fresh plugin process.
fn exchange(
    name: &str,
    command: &PluginCommand,
    request: &HostRequest,
    timeout: Duration,
) -> Result<PluginReply, PluginError> {
    debug!(
        target: PLUGIN_TARGET,
        plugin = name,
        program = %command.program().display(),
        "spawning plugin process"
    );

    let mut child = command
        .to_command()
        .spawn()
        .map_err(|err| PluginError::SpawnFailed {
            name: name.to_owned(),
            message: err.to_string(),
            source: Some(Arc::new(err)),
        })?;

    let outcome = converse(name, &mut child, request, timeout);
    if outcome.is_err() {
        terminate(&mut child);
    }
    outcome
}

fn converse(
    name: &str,
    child: &mut Child,
    request: &HostRequest,
    timeout: Duration,
) -> Result<PluginReply, PluginError> {
    // Timeouts too large to represent as an instant never expire.
    let deadline = Instant::now().checked_add(timeout);
    let stdin = child.stdin.take().ok_or_else(|| missing_pipe(name, "stdin"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| missing_pipe(name, "stdout"))?;
    let stderr = child.stderr.take().map(spawn_stderr_drain);

    write_request(name, stdin, request)?;
    let line = read_response(name, stdout, deadline, timeout)?;
    wait_for_exit(name, child, deadline, timeout)?;
    log_stderr(name, stderr);
    parse_response(name, &line)
}

fn missing_pipe(name: &str, pipe: &str) -> PluginError {
    PluginError::SpawnFailed {
        name: name.to_owned(),
        message: format!("failed to capture {pipe}"),
        source: None,
    }
}

/// Writes the serialised request to the plugin's stdin and closes it.
fn write_request(name: &str, mut stdin: impl Write, request: &HostRequest) -> Result<(), PluginError> {
    let mut json = serde_json::to_string(request).map_err(PluginError::SerializeRequest)?;
    json.push('\n');

    debug!(
        target: PLUGIN_TARGET,
        plugin = name,
        request_bytes = json.len(),
        "writing request to plugin stdin"
    );

    stdin
        .write_all(json.as_bytes())
        .and_then(|()| stdin.flush())
        .map_err(|err| PluginError::io(name, err))
}

/// Reads a single JSONL line from the plugin's stdout before `deadline`.
fn read_response(
    name: &str,
    stdout: impl Read + Send + 'static,
    deadline: Option<Instant>,
    timeout: Duration,
) -> Result<String, PluginError> {
    let start = Instant::now();
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let outcome = BufReader::new(stdout).read_line(&mut line).map(|_| line);
        drop(sender.send(outcome));
    });

    let received = match deadline {
        Some(limit) => receiver.recv_timeout(limit.saturating_duration_since(start)),
        None => receiver.recv().map_err(RecvTimeoutError::from),
    };
    let line = match received {
        Ok(outcome) => outcome.map_err(|err| PluginError::io(name, err))?,
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                target: PLUGIN_TARGET,
                plugin = name,
                timeout_secs = timeout.as_secs(),
                "plugin produced no reply in time"
            );
            return Err(PluginError::Timeout {
                name: name.to_owned(),
                timeout_secs: timeout.as_secs(),
            });
        }
        Err(RecvTimeoutError::Disconnected) => {
            return Err(PluginError::InvalidOutput {
                name: name.to_owned(),
                message: String::from("stdout reader stopped before a reply was read"),
            });
        }
    };

    debug!(
        target: PLUGIN_TARGET,
        plugin = name,
        bytes_read = line.len(),
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "read reply from plugin stdout"
    );

    if line.trim().is_empty() {
        return Err(PluginError::InvalidOutput {
            name: name.to_owned(),
            message: String::from("plugin produced no output on stdout"),
        });
    }
    Ok(line)
}

/// Drains stderr on a background thread so the child never blocks on a full
/// pipe buffer.
fn spawn_stderr_drain(stderr: impl Read + Send + 'static) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        drop(BufReader::new(stderr).read_to_string(&mut buffer));
        buffer
    })
}

fn log_stderr(name: &str, drain: Option<JoinHandle<String>>) {
    let Some(Ok(buffer)) = drain.map(JoinHandle::join) else {
        return;
    };
    if !buffer.trim().is_empty() {
        debug!(
            target: PLUGIN_TARGET,
            plugin = name,
            stderr = %buffer.trim(),
            "plugin stderr output"
        );
    }
}

/// Waits for the child process to exit before `deadline`, or indefinitely
/// when there is none.
fn wait_for_exit(
    name: &str,
    child: &mut Child,
    deadline: Option<Instant>,
    timeout: Duration,
) -> Result<(), PluginError> {
    let poll_interval = Duration::from_millis(10);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(
                    target: PLUGIN_TARGET,
                    plugin = name,
                    ?status,
                    "plugin process exited"
                );
                if status.success() {
                    return Ok(());
                }
                return Err(PluginError::NonZeroExit {
                    name: name.to_owned(),
                    status: status.code().unwrap_or(-1),
                });
            }
            Ok(None) => {
                if deadline.is_some_and(|limit| Instant::now() > limit) {
                    warn!(
                        target: PLUGIN_TARGET,
                        plugin = name,
                        timeout_secs = timeout.as_secs(),
                        "plugin timed out, killing process"
                    );
                    return Err(PluginError::Timeout {
                        name: name.to_owned(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                thread::sleep(poll_interval);
            }
            Err(err) => return Err(PluginError::io(name, err)),
        }
    }
}

fn terminate(child: &mut Child) {
    drop(child.kill());
    drop(child.wait());
}

/// Parses a JSONL reply line into a [`PluginReply`].
fn parse_response(name: &str, line: &str) -> Result<PluginReply, PluginError> {
    serde_json::from_str(line.trim()).map_err(|err| PluginError::DeserializeResponse {
        message: format!("plugin '{name}' produced invalid JSON: {err}"),
        source: Some(err),
    })
}
