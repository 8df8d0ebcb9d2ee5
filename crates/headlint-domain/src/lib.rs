//! Domain logic: source scanning, the check model and the built-in checks.
//!
//! This crate is designed to be I/O-free and highly testable.

pub mod check;
pub mod checks;
pub mod lint;
pub mod path;
pub mod registry;
pub mod scan;

pub use check::{Check, Listener, Report, RuleContext, SourceView};
pub use lint::lint_source;
pub use path::{combine_paths, is_rooted, normalize_path};
pub use registry::{CheckRegistry, CheckRegistryBuilder, RegistryError};
pub use scan::{Scanner, Token, TokenKind, tokenize};
