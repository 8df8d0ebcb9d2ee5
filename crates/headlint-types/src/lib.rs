//! Wire types for headlint.
//!
//! This crate is intentionally "dumb": pure DTOs with serde + schemars. It
//! describes both directions of the headless protocol: the JSON document read
//! from stdin and the JSON payloads carried inside stdout frames.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Frozen Vocabulary ──────────────────────────────────────────
// Frame kind bytes. These values are part of the wire contract.
pub const KIND_ERROR: u8 = 0;
pub const KIND_FINDING: u8 = 1;

/// Tag byte that follows the payload length in every frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Error = KIND_ERROR,
    Finding = KIND_FINDING,
}

impl MessageKind {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            KIND_ERROR => Some(MessageKind::Error),
            KIND_FINDING => Some(MessageKind::Finding),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Error => "error",
            MessageKind::Finding => "finding",
        }
    }
}

// ── stdin ──────────────────────────────────────────────────────

/// The document read from stdin.
///
/// Unknown fields are ignored and a missing `files` array means "nothing to
/// lint", mirroring how the parent process omits empty sections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct HeadlessConfig {
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

/// Enabled checks for one file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FileConfig {
    pub file_path: String,
    /// Check names, in the order they should run.
    #[serde(default)]
    pub rules: Vec<String>,
}

impl FileConfig {
    pub fn new(file_path: impl Into<String>, rules: &[&str]) -> Self {
        Self {
            file_path: file_path.into(),
            rules: rules.iter().map(|r| r.to_string()).collect(),
        }
    }
}

// ── stdout payloads ────────────────────────────────────────────

/// Half-open byte offsets into the text of the file a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub struct TextRange {
    pub pos: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(pos: usize, end: usize) -> Self {
        Self { pos, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.pos
    }

    /// Range covering both `self` and `other`.
    pub fn cover(&self, other: TextRange) -> TextRange {
        TextRange {
            pos: self.pos.min(other.pos),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub struct RuleMessage {
    /// Stable identifier; tooling keys on this, never on `description`.
    pub id: String,
    pub description: String,
}

impl RuleMessage {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Automatically applicable replacement of `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub struct Fix {
    pub text: String,
    pub range: TextRange,
}

impl Fix {
    pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    pub fn remove(range: TextRange) -> Self {
        Self::replace(range, "")
    }
}

/// Alternative remediation the user has to opt into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
    pub message: RuleMessage,
    pub fixes: Vec<Fix>,
}

/// One reported issue, exactly as it appears inside a Finding frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub range: TextRange,
    /// Name of the check that produced this finding.
    pub rule: String,
    pub message: RuleMessage,
    pub fixes: Vec<Fix>,
    pub suggestions: Vec<Suggestion>,
    pub file_path: String,
}

/// Payload of an Error frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
