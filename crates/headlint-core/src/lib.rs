//! Core engine: config intake, file binding, scheduling, the streaming
//! pipeline and the binary frame codec.

mod binder;
mod config;
mod frame;
mod headless;
mod linter;
mod pipeline;
mod program;
mod schedule;
mod writer;

pub use binder::{BindError, BoundFile, bind_files};
pub use config::{ConfigError, parse_config, read_config};
pub use frame::{
    DEFAULT_MAX_PAYLOAD, Frame, FrameError, FrameReader, HEADER_LEN, Message, decode_all,
    encode_frame, encode_header, write_frame, write_message,
};
pub use headless::{
    EXIT_FATAL, EXIT_OK, HeadlessError, HeadlessOptions, run_headless,
};
pub use linter::{LintError, LintSummary, Linter};
pub use pipeline::{
    DIAGNOSTIC_QUEUE_CAPACITY, Drained, FindingSender, FinishError, Pipeline, PipelineError,
    StartError,
};
pub use program::{FsProgramHost, Program, ProgramError, ProgramHost, SourceFile};
pub use schedule::Schedule;
pub use writer::{FLUSH_THRESHOLD, FrameWriter, OUTPUT_BUFFER_CAPACITY};
