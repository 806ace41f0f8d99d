//! The read loop of an editor session.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{Reply, ResponseSink};

use super::TRANSPORT_TARGET;
use super::client::{PendingCalls, SessionClient, remote_error};
use super::errors::TransportError;
use super::handler::SessionHandler;
use super::message::Message;
use super::writer::FrameWriter;

/// Maximum size of a single frame in bytes.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Error text sent when a request handler ends without replying.
pub const UNANSWERED_REQUEST: &str = "request handler failed without a reply";

/// One editor session over a reader/writer pair.
pub struct Session<R> {
    reader: R,
    writer: Arc<FrameWriter>,
    pending: Arc<PendingCalls>,
}

impl<R: BufRead> Session<R> {
    /// Creates a session and the client used to call back into the editor
    /// over the same connection.
    pub fn new(reader: R, writer: impl Write + Send + 'static) -> (Self, SessionClient) {
        let writer = Arc::new(FrameWriter::new(writer));
        let pending = Arc::new(PendingCalls::default());
        let client = SessionClient::new(Arc::clone(&writer), Arc::clone(&pending));
        let session = Self {
            reader,
            writer,
            pending,
        };
        (session, client)
    }

    /// Serves the session until the editor closes its end.
    ///
    /// Malformed frames are logged and skipped. When the stream ends, calls
    /// still waiting on the editor fail with `Disconnected`, in-flight
    /// handlers are joined, and `handler.on_disconnect` runs.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when reading from the editor fails; the
    /// shutdown sequence still runs first.
    pub fn run<H: SessionHandler>(mut self, handler: Arc<H>) -> Result<(), TransportError> {
        let mut workers = Vec::new();
        let mut line = Vec::new();

        let outcome = loop {
            match read_frame(&mut self.reader, &mut line) {
                Ok(FrameRead::Eof) => break Ok(()),
                Ok(FrameRead::Oversized(size)) => {
                    let error = TransportError::FrameTooLarge {
                        size,
                        max_size: MAX_FRAME_BYTES,
                    };
                    warn!(target: TRANSPORT_TARGET, %error, "skipping frame");
                }
                Ok(FrameRead::Line) => {
                    if line.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    match Message::decode(&line) {
                        Ok(message) => self.route(message, &handler, &mut workers),
                        Err(error) => {
                            warn!(target: TRANSPORT_TARGET, %error, "skipping frame");
                        }
                    }
                }
                Err(error) => break Err(TransportError::from(error)),
            }
            reap_finished(&mut workers);
        };

        let failed = self.pending.close();
        if failed > 0 {
            debug!(
                target: TRANSPORT_TARGET,
                failed,
                "failed editor calls still awaiting a response"
            );
        }
        for worker in workers {
            join_worker(worker);
        }
        handler.on_disconnect();
        outcome
    }

    fn route<H: SessionHandler>(
        &self,
        message: Message,
        handler: &Arc<H>,
        workers: &mut Vec<JoinHandle<()>>,
    ) {
        match message {
            Message::Request {
                msgid,
                method,
                params,
            } => {
                let handler = Arc::clone(handler);
                let sink = FrameSink::new(msgid, Arc::clone(&self.writer));
                spawn_worker(workers, format!("request {msgid}"), move || {
                    handler.on_request(&method, params, Box::new(sink));
                });
            }
            Message::Notification { method, params } => {
                let handler = Arc::clone(handler);
                spawn_worker(workers, String::from("notification"), move || {
                    handler.on_notification(&method, params);
                });
            }
            Message::Response {
                msgid,
                error,
                result,
            } => {
                let outcome = completion(error, result);
                if !self.pending.complete(msgid, outcome) {
                    warn!(
                        target: TRANSPORT_TARGET,
                        msgid,
                        "response does not match a pending call"
                    );
                }
            }
        }
    }
}

fn completion(error: Value, result: Value) -> Result<Value, bobbin_plugins::RpcError> {
    if error.is_null() {
        Ok(result)
    } else {
        Err(remote_error(error))
    }
}

/// Sink writing the reply to one request as a response frame.
///
/// A sink dropped without a reply, for example while a panicking handler
/// unwinds, answers with an error so the editor is never left waiting.
struct FrameSink {
    msgid: u64,
    writer: Arc<FrameWriter>,
    answered: bool,
}

impl FrameSink {
    const fn new(msgid: u64, writer: Arc<FrameWriter>) -> Self {
        Self {
            msgid,
            writer,
            answered: false,
        }
    }

    fn answer(&mut self, reply: Reply) {
        self.answered = true;
        if let Err(error) = self.writer.write(&Message::reply(self.msgid, reply)) {
            warn!(
                target: TRANSPORT_TARGET,
                msgid = self.msgid,
                %error,
                "failed to write response"
            );
        }
    }
}

impl ResponseSink for FrameSink {
    fn send(mut self: Box<Self>, reply: Reply) {
        self.answer(reply);
    }
}

impl Drop for FrameSink {
    fn drop(&mut self) {
        if self.answered {
            return;
        }
        warn!(
            target: TRANSPORT_TARGET,
            msgid = self.msgid,
            "request handler ended without a reply"
        );
        self.answer(Reply::Error(String::from(UNANSWERED_REQUEST)));
    }
}

fn spawn_worker(
    workers: &mut Vec<JoinHandle<()>>,
    label: String,
    work: impl FnOnce() + Send + 'static,
) {
    match thread::Builder::new().name(format!("bobbind {label}")).spawn(work) {
        Ok(handle) => workers.push(handle),
        Err(error) => {
            warn!(target: TRANSPORT_TARGET, %error, call = %label, "failed to spawn handler thread");
        }
    }
}

fn reap_finished(workers: &mut Vec<JoinHandle<()>>) {
    let (finished, running): (Vec<_>, Vec<_>) =
        workers.drain(..).partition(JoinHandle::is_finished);
    *workers = running;
    for worker in finished {
        join_worker(worker);
    }
}

fn join_worker(worker: JoinHandle<()>) {
    if worker.join().is_err() {
        warn!(target: TRANSPORT_TARGET, "handler thread panicked");
    }
}

enum FrameRead {
    Line,
    Oversized(usize),
    Eof,
}

/// Reads one newline-terminated frame into `line`.
///
/// Bytes beyond [`MAX_FRAME_BYTES`] are consumed but not buffered, so an
/// oversized frame is skipped without exhausting memory.
fn read_frame(reader: &mut impl BufRead, line: &mut Vec<u8>) -> io::Result<FrameRead> {
    line.clear();
    let mut size = 0_usize;
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        if available.is_empty() {
            return Ok(match size {
                0 => FrameRead::Eof,
                size if size > MAX_FRAME_BYTES => FrameRead::Oversized(size),
                _ => FrameRead::Line,
            });
        }

        let newline = available.iter().position(|byte| *byte == b'\n');
        let chunk = newline.map_or(available, |end| available.get(..end).unwrap_or(available));
        size += chunk.len();
        if size <= MAX_FRAME_BYTES {
            line.extend_from_slice(chunk);
        }
        let consumed = chunk.len() + usize::from(newline.is_some());
        reader.consume(consumed);

        if newline.is_some() {
            return Ok(if size > MAX_FRAME_BYTES {
                FrameRead::Oversized(size)
            } else {
                FrameRead::Line
            });
        }
    }
}
