//! In-memory program host and output capture.

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use headlint_core::{Frame, Message, Program, ProgramError, ProgramHost, decode_all};
use headlint_types::Finding;

/// Program host serving a fixed set of in-memory files.
///
/// `tsconfig` and `cwd` passed to [`ProgramHost::create_program`] are
/// ignored; relative file names resolve against the host's own cwd.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    cwd: String,
    files: Vec<(String, String)>,
}

impl StaticHost {
    pub fn new(cwd: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.push((path.into(), text.into()));
        self
    }
}

impl ProgramHost for StaticHost {
    fn create_program(&self, _tsconfig: &Path, _cwd: &Path) -> Result<Program, ProgramError> {
        Ok(Program::from_sources(&self.cwd, self.files.iter().cloned()))
    }
}

/// `Write` handle whose bytes stay readable after the writer moved to
/// another thread.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().expect("buffer lock").clone()
    }

    pub fn frames(&self) -> Vec<Frame> {
        decode_all(&self.bytes()).expect("stdout should hold whole frames")
    }

    pub fn messages(&self) -> Vec<Message> {
        collect_messages(&self.bytes())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Decode every frame in `bytes`, panicking on malformed output.
pub fn collect_messages(bytes: &[u8]) -> Vec<Message> {
    decode_all(bytes)
        .expect("stdout should hold whole frames")
        .iter()
        .map(|frame| frame.message().expect("payload should decode"))
        .collect()
}

/// Findings only, in stream order.
pub fn collect_findings(bytes: &[u8]) -> Vec<Finding> {
    collect_messages(bytes)
        .into_iter()
        .filter_map(|m| match m {
            Message::Finding(f) => Some(f),
            Message::Error(_) => None,
        })
        .collect()
}

/// Error messages only, in stream order.
pub fn collect_errors(bytes: &[u8]) -> Vec<String> {
    collect_messages(bytes)
        .into_iter()
        .filter_map(|m| match m {
            Message::Error(e) => Some(e.error),
            Message::Finding(_) => None,
        })
        .collect()
}
