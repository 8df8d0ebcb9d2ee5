//! Many-producer, single-consumer path from check workers to stdout.
//!
//! Workers push findings into one bounded queue. A dedicated consumer thread
//! owns the [`FrameWriter`] and drains the queue FIFO. A producer blocks while
//! the queue is full, which caps memory at [`DIAGNOSTIC_QUEUE_CAPACITY`]
//! pending findings no matter how fast checks report.
//!
//! Order across producers is whatever order sends reach the queue. Findings
//! sent by one thread keep their send order.

use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded};
use headlint_types::Finding;
use tracing::{debug, warn};

use crate::frame::FrameError;
use crate::writer::FrameWriter;

/// Pending findings the queue holds before producers block.
pub const DIAGNOSTIC_QUEUE_CAPACITY: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to start output thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("output thread panicked")]
    ConsumerPanicked,

    #[error("failed to write output: {0}")]
    Output(#[source] FrameError),
}

/// Cloneable producer handle.
#[derive(Clone)]
pub struct FindingSender {
    tx: Sender<Finding>,
}

impl FindingSender {
    /// Queue one finding, blocking while the queue is full.
    ///
    /// If the consumer has stopped the finding is dropped; the output error
    /// is reported by [`Pipeline::finish`].
    pub fn send(&self, finding: Finding) {
        if self.tx.send(finding).is_err() {
            debug!("Output consumer stopped; dropping finding");
        }
    }

    /// Findings queued but not yet taken by the consumer.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }
}

/// What the consumer hands back once the queue is closed and drained.
pub struct Drained<W: Write> {
    pub writer: FrameWriter<W>,
    pub findings: usize,
}

/// The output thread could not be started. The writer never left the
/// caller, so the failure can still be reported through it.
pub struct StartError<W: Write> {
    pub error: PipelineError,
    pub writer: FrameWriter<W>,
}

/// The pipeline did not drain cleanly.
///
/// `writer` is `Some` when stdout is still usable (the consumer panicked
/// between frames) and `None` when writing to it is what failed.
pub struct FinishError<W: Write> {
    pub error: PipelineError,
    pub writer: Option<FrameWriter<W>>,
}

impl<W: Write> fmt::Debug for StartError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<W: Write> fmt::Debug for FinishError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinishError")
            .field("error", &self.error)
            .field("writer", &self.writer.is_some())
            .finish()
    }
}

enum ConsumerFailure {
    Output(FrameError),
    Panicked,
}

struct ConsumerExit<W: Write> {
    writer: FrameWriter<W>,
    findings: usize,
    failure: Option<ConsumerFailure>,
}

pub struct Pipeline<W: Write> {
    sender: FindingSender,
    consumer: JoinHandle<Option<ConsumerExit<W>>>,
}

impl<W: Write + Send + 'static> Pipeline<W> {
    pub fn start(writer: FrameWriter<W>) -> Result<Self, StartError<W>> {
        Self::with_capacity(writer, DIAGNOSTIC_QUEUE_CAPACITY)
    }

    /// Spawn the consumer, then hand it the writer.
    pub fn with_capacity(
        writer: FrameWriter<W>,
        capacity: usize,
    ) -> Result<Self, StartError<W>> {
        let (tx, rx) = bounded(capacity);
        let (writer_tx, writer_rx) = bounded(1);
        let consumer = match thread::Builder::new()
            .name("headlint-output".to_string())
            .spawn(move || consume(rx, writer_rx))
        {
            Ok(consumer) => consumer,
            Err(err) => {
                return Err(StartError {
                    error: PipelineError::Spawn(err),
                    writer,
                });
            }
        };
        if let Err(returned) = writer_tx.send(writer) {
            return Err(StartError {
                error: PipelineError::ConsumerPanicked,
                writer: returned.into_inner(),
            });
        }
        Ok(Self {
            sender: FindingSender { tx },
            consumer,
        })
    }

    pub fn sender(&self) -> FindingSender {
        self.sender.clone()
    }

    /// Close the queue, wait for the consumer to drain it and take the
    /// writer back.
    ///
    /// Every [`FindingSender`] clone must be dropped first, otherwise this
    /// waits forever.
    pub fn finish(self) -> Result<Drained<W>, FinishError<W>> {
        drop(self.sender);
        let exit = match self.consumer.join() {
            Ok(Some(exit)) => exit,
            Ok(None) | Err(_) => {
                return Err(FinishError {
                    error: PipelineError::ConsumerPanicked,
                    writer: None,
                });
            }
        };
        match exit.failure {
            None => Ok(Drained {
                writer: exit.writer,
                findings: exit.findings,
            }),
            Some(ConsumerFailure::Output(err)) => Err(FinishError {
                error: PipelineError::Output(err),
                writer: None,
            }),
            Some(ConsumerFailure::Panicked) => Err(FinishError {
                error: PipelineError::ConsumerPanicked,
                writer: Some(exit.writer),
            }),
        }
    }
}

fn consume<W: Write>(
    rx: Receiver<Finding>,
    writers: Receiver<FrameWriter<W>>,
) -> Option<ConsumerExit<W>> {
    let mut writer = writers.recv().ok()?;
    let mut findings = 0usize;

    // A panic while serializing or writing must not take stdout with it.
    let drained = panic::catch_unwind(AssertUnwindSafe(|| {
        for finding in rx.iter() {
            writer.write_finding(&finding)?;
            findings += 1;
        }
        writer.flush()
    }));

    let failure = match drained {
        Ok(Ok(())) => {
            debug!("Output drained: {} finding(s)", findings);
            None
        }
        Ok(Err(err)) => {
            warn!("Stopping output after write failure: {}", err);
            Some(ConsumerFailure::Output(err))
        }
        Err(_) => {
            warn!("Output thread panicked after {} finding(s)", findings);
            Some(ConsumerFailure::Panicked)
        }
    };
    // Dropping the receiver on return disconnects producers.
    Some(ConsumerExit {
        writer,
        findings,
        failure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Message, decode_all};
    use headlint_types::{RuleMessage, TextRange};
    use std::io;
    use std::sync::{Arc, Mutex};

    fn finding(pos: usize) -> Finding {
        Finding {
            range: TextRange::new(pos, pos + 1),
            rule: "r".to_string(),
            message: RuleMessage::new("id", "d"),
            fixes: vec![],
            suggestions: vec![],
            file_path: "/a.ts".to_string(),
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
        }
    }

    /// Shared sink so the test can look at bytes the consumer wrote.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn single_producer_order_is_preserved() {
        let pipeline = Pipeline::start(FrameWriter::new(Vec::new())).unwrap();
        let tx = pipeline.sender();
        for pos in [10, 5, 20] {
            tx.send(finding(pos));
        }
        drop(tx);

        let drained = pipeline.finish().unwrap();
        assert_eq!(drained.findings, 3);
        let bytes = drained.writer.finish().unwrap();
        let positions: Vec<_> = decode_all(&bytes)
            .unwrap()
            .iter()
            .map(|f| match f.message().unwrap() {
                Message::Finding(f) => f.range.pos,
                Message::Error(e) => panic!("unexpected error frame: {}", e.error),
            })
            .collect();
        assert_eq!(positions, [10, 5, 20]);
    }

    #[test]
    fn finish_flushes_everything() {
        let sink = Shared::default();
        let pipeline = Pipeline::start(FrameWriter::new(sink.clone())).unwrap();
        pipeline.sender().send(finding(1));
        let _drained = pipeline.finish().unwrap();
        let bytes = sink.0.lock().unwrap().clone();
        assert_eq!(decode_all(&bytes).unwrap().len(), 1);
    }

    #[test]
    fn writer_comes_back_after_drain_for_the_error_frame() {
        let pipeline = Pipeline::start(FrameWriter::new(Vec::new())).unwrap();
        pipeline.sender().send(finding(0));
        let mut drained = pipeline.finish().unwrap();
        drained.writer.write_error("error running linter: x").unwrap();
        let frames = decode_all(&drained.writer.finish().unwrap()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[1].message().unwrap(), Message::Error(_)));
    }

    #[test]
    fn output_failure_reported_on_finish_and_producers_do_not_hang() {
        // Tiny buffer so the first frame hits the broken writer.
        let pipeline = Pipeline::with_capacity(FrameWriter::with_capacity(1, Broken), 2).unwrap();
        let tx = pipeline.sender();
        for pos in 0..100 {
            tx.send(finding(pos));
        }
        drop(tx);
        let Err(err) = pipeline.finish() else {
            panic!("expected the pipeline to fail");
        };
        assert!(matches!(err.error, PipelineError::Output(_)));
        assert!(err.writer.is_none());
    }

    #[test]
    fn empty_run_writes_nothing() {
        let pipeline = Pipeline::start(FrameWriter::new(Vec::new())).unwrap();
        let drained = pipeline.finish().unwrap();
        assert_eq!(drained.findings, 0);
        assert!(drained.writer.finish().unwrap().is_empty());
    }

    #[test]
    fn sender_reports_capacity() {
        let pipeline = Pipeline::start(FrameWriter::new(Vec::new())).unwrap();
        assert_eq!(pipeline.sender().capacity(), DIAGNOSTIC_QUEUE_CAPACITY);
        assert_eq!(pipeline.sender().pending(), 0);
        pipeline.finish().unwrap();
    }

    /// Panics on its first write, then behaves.
    #[derive(Clone, Default)]
    struct PanicsOnce {
        tripped: Arc<Mutex<bool>>,
        out: Shared,
    }

    impl Write for PanicsOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let first = !std::mem::replace(&mut *self.tripped.lock().unwrap(), true);
            if first {
                panic!("sink exploded");
            }
            self.out.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn consumer_panic_hands_the_writer_back() {
        let sink = PanicsOnce::default();
        // Capacity 1: the frame goes straight to the sink.
        let pipeline =
            Pipeline::with_capacity(FrameWriter::with_capacity(1, sink.clone()), 4).unwrap();
        let tx = pipeline.sender();
        tx.send(finding(0));
        tx.send(finding(1));
        drop(tx);

        let Err(err) = pipeline.finish() else {
            panic!("expected the pipeline to fail");
        };
        assert!(matches!(err.error, PipelineError::ConsumerPanicked));
        let mut writer = err.writer.expect("writer survives a consumer panic");
        writer.write_error("output thread panicked").unwrap();
        writer.flush().unwrap();

        let bytes = sink.out.0.lock().unwrap().clone();
        let frames = decode_all(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0].message().unwrap(), Message::Error(_)));
    }
}
