//! JSON schema validators for headlint wire payloads.
//!
//! Schemas are loaded from the schemas/ directory at the workspace root.

use jsonschema::JSONSchema;

/// Error type for schema validation failures.
#[derive(Debug)]
pub struct SchemaValidationError {
    /// The validation errors.
    pub errors: Vec<String>,
}

impl std::fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Schema validation failed: {}", self.errors.join("; "))
    }
}

impl std::error::Error for SchemaValidationError {}

fn compile(raw: &str, what: &str) -> JSONSchema {
    let schema: serde_json::Value = serde_json::from_str(raw)
        .unwrap_or_else(|e| panic!("{what} schema should be valid JSON: {e}"));
    JSONSchema::compile(&schema).unwrap_or_else(|e| panic!("{what} schema should compile: {e}"))
}

/// Load and compile the stdin config schema.
pub fn load_config_schema() -> JSONSchema {
    compile(
        include_str!("../../../schemas/headlint.config.schema.json"),
        "Config",
    )
}

/// Load and compile the Finding payload schema.
pub fn load_finding_schema() -> JSONSchema {
    compile(
        include_str!("../../../schemas/headlint.finding.schema.json"),
        "Finding",
    )
}

/// Load and compile the Error payload schema.
pub fn load_error_schema() -> JSONSchema {
    compile(
        include_str!("../../../schemas/headlint.error.schema.json"),
        "Error",
    )
}

pub fn validate_config_json(json: &serde_json::Value) -> Result<(), SchemaValidationError> {
    validate_with_schema(&load_config_schema(), json)
}

pub fn validate_finding_json(json: &serde_json::Value) -> Result<(), SchemaValidationError> {
    validate_with_schema(&load_finding_schema(), json)
}

pub fn validate_error_json(json: &serde_json::Value) -> Result<(), SchemaValidationError> {
    validate_with_schema(&load_error_schema(), json)
}

/// Validate a raw frame payload against the schema for its kind.
pub fn validate_payload(
    kind: headlint_types::MessageKind,
    payload: &[u8],
) -> Result<(), SchemaValidationError> {
    let json: serde_json::Value = serde_json::from_slice(payload).map_err(|e| SchemaValidationError {
        errors: vec![format!("payload is not JSON: {e}")],
    })?;
    match kind {
        headlint_types::MessageKind::Error => validate_error_json(&json),
        headlint_types::MessageKind::Finding => validate_finding_json(&json),
    }
}

fn validate_with_schema(
    schema: &JSONSchema,
    json: &serde_json::Value,
) -> Result<(), SchemaValidationError> {
    let result = schema.validate(json);
    match result {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            Err(SchemaValidationError {
                errors: error_messages,
            })
        }
    }
}
