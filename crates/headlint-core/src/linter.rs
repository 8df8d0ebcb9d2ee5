//! Fixed-size worker pool that runs checks over files.

use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use headlint_domain::{Check, lint_source};
use headlint_types::Finding;
use tracing::{debug, trace};

use crate::program::SourceFile;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LintError {
    #[error("worker panicked: {message}")]
    WorkerPanicked { message: String },

    #[error("failed to spawn worker: {message}")]
    Spawn { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LintSummary {
    pub files: usize,
    pub findings: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Linter {
    workers: NonZeroUsize,
}

impl Default for Linter {
    fn default() -> Self {
        let workers = thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Self { workers }
    }
}

impl Linter {
    pub fn new(workers: NonZeroUsize) -> Self {
        Self { workers }
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Run checks over `files` and pass every finding to `sink`.
    ///
    /// Workers take files in slice order from a shared counter, so the
    /// first files are started first. Each worker reports a file's findings
    /// in the order its checks discover them. A panicking worker does not
    /// stop the others; the panic is returned once all workers are done.
    pub fn run<R, S>(&self, files: &[&SourceFile], resolve: R, sink: S) -> Result<LintSummary, LintError>
    where
        R: Fn(&SourceFile) -> Vec<Arc<dyn Check>> + Sync,
        S: Fn(Finding) + Sync,
    {
        let workers = self.workers.get().min(files.len());
        debug!("Linting {} file(s) on {} worker(s)", files.len(), workers);

        let next = AtomicUsize::new(0);
        let findings = AtomicUsize::new(0);

        let worker = || {
            loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                let Some(file) = files.get(i) else {
                    break;
                };
                let checks = resolve(file);
                trace!("Linting {} with {} check(s)", file.file_name(), checks.len());
                lint_source(file.file_name(), file.text(), &checks, &mut |finding: Finding| {
                    findings.fetch_add(1, Ordering::Relaxed);
                    sink(finding);
                });
            }
        };

        let mut first_error = None;
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for n in 0..workers {
                match thread::Builder::new()
                    .name(format!("headlint-worker-{n}"))
                    .spawn_scoped(scope, &worker)
                {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        first_error.get_or_insert(LintError::Spawn {
                            message: err.to_string(),
                        });
                        break;
                    }
                }
            }
            for handle in handles {
                if let Err(payload) = handle.join() {
                    first_error.get_or_insert(LintError::WorkerPanicked {
                        message: panic_message(payload.as_ref()),
                    });
                }
            }
        });

        if let Some(err) = first_error {
            return Err(err);
        }
        Ok(LintSummary {
            files: files.len(),
            findings: findings.into_inner(),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
