//! Property-based tests for headlint-types.
//!
//! Every payload that can appear on the wire must validate against the
//! checked-in schema and survive a JSON round-trip unchanged.

use headlint_types::{
    ErrorPayload, FileConfig, Finding, Fix, HeadlessConfig, RuleMessage, Suggestion, TextRange,
};
use jsonschema::JSONSchema;
use proptest::prelude::*;

fn load_schema(raw: &str) -> JSONSchema {
    let schema: serde_json::Value = serde_json::from_str(raw).expect("valid JSON schema");
    JSONSchema::compile(&schema).expect("valid JSON schema")
}

fn load_config_schema() -> JSONSchema {
    load_schema(include_str!("../../../schemas/headlint.config.schema.json"))
}

fn load_finding_schema() -> JSONSchema {
    load_schema(include_str!("../../../schemas/headlint.finding.schema.json"))
}

fn load_error_schema() -> JSONSchema {
    load_schema(include_str!("../../../schemas/headlint.error.schema.json"))
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    // Includes quotes, escapes and non-ASCII so JSON escaping is exercised.
    "[a-zA-Z0-9 _.\"\\\\/é€-]{0,40}"
}

fn arb_path() -> impl Strategy<Value = String> {
    "(/[a-z]{1,8}){1,4}\\.(ts|tsx|mts)"
}

fn arb_range() -> impl Strategy<Value = TextRange> {
    (0usize..100_000, 0usize..500).prop_map(|(pos, len)| TextRange::new(pos, pos + len))
}

fn arb_message() -> impl Strategy<Value = RuleMessage> {
    ("[a-zA-Z]{1,20}", arb_text()).prop_map(|(id, description)| RuleMessage { id, description })
}

fn arb_fix() -> impl Strategy<Value = Fix> {
    (arb_text(), arb_range()).prop_map(|(text, range)| Fix { text, range })
}

fn arb_suggestion() -> impl Strategy<Value = Suggestion> {
    (arb_message(), prop::collection::vec(arb_fix(), 0..3))
        .prop_map(|(message, fixes)| Suggestion { message, fixes })
}

fn arb_finding() -> impl Strategy<Value = Finding> {
    (
        arb_range(),
        "[a-z]{1,10}(-[a-z]{1,10}){0,3}",
        arb_message(),
        prop::collection::vec(arb_fix(), 0..3),
        prop::collection::vec(arb_suggestion(), 0..3),
        arb_path(),
    )
        .prop_map(
            |(range, rule, message, fixes, suggestions, file_path)| Finding {
                range,
                rule,
                message,
                fixes,
                suggestions,
                file_path,
            },
        )
}

fn arb_config() -> impl Strategy<Value = HeadlessConfig> {
    prop::collection::vec(
        (
            arb_path(),
            prop::collection::vec("[a-z]{1,10}(-[a-z]{1,10}){0,2}", 0..4),
        )
            .prop_map(|(file_path, rules)| FileConfig { file_path, rules }),
        0..6,
    )
    .prop_map(|files| HeadlessConfig { files })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn finding_validates_against_schema(finding in arb_finding()) {
        let schema = load_finding_schema();
        let json_value = serde_json::to_value(&finding).expect("Finding should serialize");

        let result = schema.validate(&json_value);
        prop_assert!(
            result.is_ok(),
            "Finding should validate against schema. Errors: {:?}",
            result.err().map(|e| e.map(|e| e.to_string()).collect::<Vec<_>>())
        );
    }

    #[test]
    fn finding_round_trips_through_json(finding in arb_finding()) {
        let bytes = serde_json::to_vec(&finding).expect("serialize");
        let back: Finding = serde_json::from_slice(&bytes).expect("deserialize");
        prop_assert_eq!(back, finding);
    }

    #[test]
    fn error_payload_validates_against_schema(message in arb_text()) {
        let schema = load_error_schema();
        let json_value = serde_json::to_value(ErrorPayload::new(message)).expect("serialize");
        prop_assert!(schema.is_valid(&json_value));
    }

    #[test]
    fn config_validates_and_round_trips(config in arb_config()) {
        let schema = load_config_schema();
        let json_value = serde_json::to_value(&config).expect("serialize");
        prop_assert!(schema.is_valid(&json_value));

        let back: HeadlessConfig = serde_json::from_value(json_value).expect("deserialize");
        prop_assert_eq!(back, config);
    }
}

#[test]
fn schema_rejects_finding_without_rule() {
    let schema = load_finding_schema();
    let value = serde_json::json!({
        "range": {"pos": 0, "end": 1},
        "message": {"id": "x", "description": "y"},
        "fixes": [],
        "suggestions": [],
        "file_path": "/a.ts"
    });
    assert!(!schema.is_valid(&value));
}

#[test]
fn schema_rejects_negative_offsets() {
    let schema = load_finding_schema();
    let value = serde_json::json!({
        "range": {"pos": -1, "end": 1},
        "rule": "r",
        "message": {"id": "x", "description": "y"},
        "fixes": [],
        "suggestions": [],
        "file_path": "/a.ts"
    });
    assert!(!schema.is_valid(&value));
}

#[test]
fn config_schema_accepts_minimal_document() {
    let schema = load_config_schema();
    assert!(schema.is_valid(&serde_json::json!({})));
    assert!(schema.is_valid(&serde_json::json!({"files": [{"file_path": "/a.ts"}]})));
    assert!(!schema.is_valid(&serde_json::json!({"files": [{"rules": []}]})));
}
