//! In-memory streams and handlers for transport tests.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use crate::dispatch::{Reply, ResponseSink};

use super::handler::SessionHandler;
use super::message::Message;

/// Writer whose bytes can be inspected from another thread.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Decodes every complete line written so far.
    pub(crate) fn frames(&self) -> Vec<Message> {
        let bytes = self.bytes.lock().expect("buffer lock").clone();
        bytes
            .split(|byte| *byte == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| Message::decode(line).expect("valid frame"))
            .collect()
    }

    /// Waits until at least `count` frames have been written.
    pub(crate) fn wait_for_frames(&self, count: usize) -> Vec<Message> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let frames = self.frames();
            if frames.len() >= count {
                return frames;
            }
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {count} frame(s), have {}",
                frames.len()
            );
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader fed line by line from a channel; dropping the sender ends the
/// stream.
pub(crate) struct ChannelReader {
    receiver: mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl ChannelReader {
    pub(crate) fn new() -> (mpsc::Sender<Vec<u8>>, Self) {
        let (sender, receiver) = mpsc::channel();
        (
            sender,
            Self {
                receiver,
                pending: Vec::new(),
            },
        )
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.receiver.recv() {
                Ok(bytes) => self.pending = bytes,
                Err(_) => return Ok(0),
            }
        }
        let count = buf.len().min(self.pending.len());
        buf[..count].copy_from_slice(&self.pending[..count]);
        self.pending.drain(..count);
        Ok(count)
    }
}

/// Encodes `value` as one input line.
pub(crate) fn line(value: &Value) -> Vec<u8> {
    let mut bytes = serde_json::to_vec(value).expect("encode line");
    bytes.push(b'\n');
    bytes
}

/// Handler that answers each request with its method name.
#[derive(Default)]
pub(crate) struct RecordingHandler {
    notifications: Mutex<Vec<(String, Vec<Value>)>>,
    disconnects: AtomicUsize,
}

impl RecordingHandler {
    pub(crate) fn notifications(&self) -> Vec<(String, Vec<Value>)> {
        self.notifications.lock().expect("notifications lock").clone()
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl SessionHandler for RecordingHandler {
    fn on_request(&self, method: &str, args: Vec<Value>, sink: Box<dyn ResponseSink>) {
        sink.send(Reply::Success(json!({ "method": method, "args": args })));
    }

    fn on_notification(&self, method: &str, args: Vec<Value>) {
        self.notifications
            .lock()
            .expect("notifications lock")
            .push((method.to_owned(), args));
    }

    fn on_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}
