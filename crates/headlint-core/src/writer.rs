use std::io::{BufWriter, Write};

use headlint_types::{ErrorPayload, Finding, MessageKind};
use tracing::trace;

use crate::frame::{FrameError, write_message};

/// Size of the stdout buffer.
pub const OUTPUT_BUFFER_CAPACITY: usize = 4096 * 100;

/// Once free buffer space drops below this many bytes the writer flushes.
pub const FLUSH_THRESHOLD: usize = 4096;

/// Buffered frame sink over the process's standard output.
///
/// After each frame the writer flushes if fewer than [`FLUSH_THRESHOLD`]
/// bytes of buffer remain, so findings reach the parent process in bursts
/// rather than only when the buffer is completely full.
pub struct FrameWriter<W: Write> {
    inner: BufWriter<W>,
    frames: usize,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_capacity(OUTPUT_BUFFER_CAPACITY, inner)
    }

    pub fn with_capacity(capacity: usize, inner: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity, inner),
            frames: 0,
        }
    }

    pub fn write_finding(&mut self, finding: &Finding) -> Result<(), FrameError> {
        write_message(&mut self.inner, MessageKind::Finding, finding)?;
        self.after_frame()
    }

    pub fn write_error(&mut self, message: &str) -> Result<(), FrameError> {
        write_message(&mut self.inner, MessageKind::Error, &ErrorPayload::new(message))?;
        self.after_frame()
    }

    fn after_frame(&mut self) -> Result<(), FrameError> {
        self.frames += 1;
        if self.available() < FLUSH_THRESHOLD {
            trace!("Flushing output after {} frame(s)", self.frames);
            self.inner.flush()?;
        }
        Ok(())
    }

    /// Free space left in the buffer.
    pub fn available(&self) -> usize {
        self.inner.capacity().saturating_sub(self.inner.buffer().len())
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    pub fn flush(&mut self) -> Result<(), FrameError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> Result<W, FrameError> {
        self.inner
            .into_inner()
            .map_err(|e| FrameError::Io(e.into_error()))
    }

    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }
}
