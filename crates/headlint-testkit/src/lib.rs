//! Shared test utilities for the headlint workspace.
//!
//! This crate provides:
//! - **arb**: Proptest strategies for configs, findings and source text
//! - **checks**: Scripted checks with fully controlled output
//! - **host**: In-memory program host and frame decoding helpers
//! - **schema**: JSON schema validators for wire payloads
//! - **fixtures**: Sample sources and on-disk project builders
//!
//! # Example
//!
//! ```rust,ignore
//! use headlint_testkit::{StaticHost, collect_messages};
//!
//! let host = StaticHost::new("/proj").with_file("/proj/a.ts", "var a;");
//! ```

pub mod arb;
pub mod checks;
pub mod fixtures;
pub mod host;
pub mod schema;

pub use arb::{arb_config, arb_finding, arb_source_text};
pub use checks::{NoFoo, PanicOn, ScriptedCheck};
pub use fixtures::{DEFAULT_TSCONFIG, config_json, sample_sources, write_project};
pub use host::{SharedBuffer, StaticHost, collect_errors, collect_findings, collect_messages};
pub use schema::{
    validate_config_json, validate_error_json, validate_finding_json, validate_payload,
};
