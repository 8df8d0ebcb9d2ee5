//! Reads the per-file check configuration from stdin.

use std::io::{self, Read};

use headlint_types::HeadlessConfig;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading from stdin: {0}")]
    Read(#[source] io::Error),

    #[error("error parsing config: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Read the whole of `reader` and parse it as one config document.
pub fn read_config(mut reader: impl Read) -> Result<HeadlessConfig, ConfigError> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).map_err(ConfigError::Read)?;
    debug!("Read {} config bytes", raw.len());
    parse_config(&raw)
}

pub fn parse_config(raw: &[u8]) -> Result<HeadlessConfig, ConfigError> {
    let config: HeadlessConfig = serde_json::from_slice(raw).map_err(ConfigError::Parse)?;
    debug!("Config lists {} file(s)", config.files.len());
    Ok(config)
}
