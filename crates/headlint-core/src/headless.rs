//! Headless entry point: stdin config in, framed findings out.

use std::io::{Read, Write};
use std::path::PathBuf;

use headlint_domain::{CheckRegistry, RegistryError};
use tracing::{info, warn};

use crate::binder::{BindError, bind_files};
use crate::config::{ConfigError, read_config};
use crate::frame::FrameError;
use crate::linter::{LintError, LintSummary, Linter};
use crate::pipeline::{FinishError, Pipeline, PipelineError, StartError};
use crate::program::{ProgramError, ProgramHost};
use crate::schedule::Schedule;
use crate::writer::FrameWriter;

/// Exit status for a completed run, whatever it found.
pub const EXIT_OK: i32 = 0;
/// Exit status after any fatal error.
pub const EXIT_FATAL: i32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error("error creating TS program: {0}")]
    Program(#[source] ProgramError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    UnknownCheck(#[from] RegistryError),

    #[error("error running linter: {0}")]
    Lint(#[source] LintError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to write output: {0}")]
    Output(#[source] FrameError),
}

impl HeadlessError {
    /// Whether this error is reported to the parent as an Error frame.
    /// Output failures are not: stdout is the thing that failed.
    pub fn is_reported(&self) -> bool {
        !matches!(
            self,
            HeadlessError::Pipeline(PipelineError::Output(_)) | HeadlessError::Output(_)
        )
    }

    pub fn exit_code(&self) -> i32 {
        EXIT_FATAL
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub tsconfig: PathBuf,
    pub cwd: PathBuf,
    pub linter: Linter,
}

impl HeadlessOptions {
    pub fn new(tsconfig: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            tsconfig: tsconfig.into(),
            cwd: cwd.into(),
            linter: Linter::default(),
        }
    }

    pub fn with_linter(mut self, linter: Linter) -> Self {
        self.linter = linter;
        self
    }
}

/// Run one headless session.
///
/// Setup happens in order: build the program, read the config from `stdin`,
/// bind files, resolve checks. Any failure there writes exactly one Error
/// frame and no Finding frames. Otherwise checks run on the worker pool
/// while one consumer thread streams Finding frames to `stdout`; if the run
/// then fails, the Error frame follows the drained findings.
///
/// `stdout` is flushed on every path. On `Err` the process should exit with
/// [`HeadlessError::exit_code`].
pub fn run_headless<H, R, W>(
    host: &H,
    registry: &CheckRegistry,
    options: &HeadlessOptions,
    stdin: R,
    stdout: W,
) -> Result<LintSummary, HeadlessError>
where
    H: ProgramHost + ?Sized,
    R: Read,
    W: Write + Send + 'static,
{
    let writer = FrameWriter::new(stdout);

    let program = match host.create_program(&options.tsconfig, &options.cwd) {
        Ok(program) => program,
        Err(err) => return report_fatal(writer, HeadlessError::Program(err)),
    };
    info!("Program loaded with {} file(s)", program.len());

    let config = match read_config(stdin) {
        Ok(config) => config,
        Err(err) => return report_fatal(writer, err.into()),
    };

    let planned = bind_files(&program, &config)
        .map_err(HeadlessError::from)
        .and_then(|bound| Schedule::plan(bound, registry).map_err(HeadlessError::from));
    let schedule = match planned {
        Ok(schedule) => schedule,
        Err(err) => return report_fatal(writer, err),
    };

    let pipeline = match Pipeline::start(writer) {
        Ok(pipeline) => pipeline,
        Err(StartError { error, writer }) => return report_fatal(writer, error.into()),
    };
    let sender = pipeline.sender();
    let linted = schedule.dispatch(&options.linter, |finding| sender.send(finding));
    drop(sender);

    let drained = match pipeline.finish() {
        Ok(drained) => drained,
        Err(FinishError {
            error,
            writer: Some(writer),
        }) => return report_fatal(writer, error.into()),
        Err(FinishError {
            error,
            writer: None,
        }) => return Err(error.into()),
    };
    match linted {
        Ok(summary) => {
            drained.writer.finish().map_err(HeadlessError::Output)?;
            info!(
                "Linted {} file(s), wrote {} finding(s)",
                summary.files, drained.findings
            );
            Ok(summary)
        }
        Err(err) => report_fatal(drained.writer, HeadlessError::Lint(err)),
    }
}

/// Write `err` as the terminal Error frame, flush, and return it.
fn report_fatal<W: Write, T>(mut writer: FrameWriter<W>, err: HeadlessError) -> Result<T, HeadlessError> {
    let written = writer.write_error(&err.to_string()).and_then(|()| writer.flush());
    if let Err(write_err) = written {
        warn!("Could not write error frame: {}", write_err);
        return Err(HeadlessError::Output(write_err));
    }
    Err(err)
}
