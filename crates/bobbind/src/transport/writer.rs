//! Shared, line-atomic frame writer.

use std::io::Write;
use std::sync::Mutex;

use super::errors::TransportError;
use super::message::Message;

/// Serialises frames onto the session's output stream.
///
/// Every frame is written and flushed under one lock, so concurrent replies
/// never interleave within a line.
pub(crate) struct FrameWriter {
    inner: Mutex<Box<dyn Write + Send>>,
}

impl FrameWriter {
    pub(crate) fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Box::new(writer)),
        }
    }

    pub(crate) fn write(&self, message: &Message) -> Result<(), TransportError> {
        let mut line = message.encode()?;
        line.push(b'\n');
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| TransportError::LockPoisoned)?;
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}
