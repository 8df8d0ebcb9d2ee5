//! Proptest strategies for generating valid test inputs.
//!
//! # Bounds
//!
//! To keep tests fast, the following bounds are enforced:
//! - Max files per config: 8
//! - Max rules per file: 4
//! - Max fixes / suggestions per finding: 3
//! - Max source fragments per file: 24

use headlint_types::{FileConfig, Finding, Fix, HeadlessConfig, RuleMessage, Suggestion, TextRange};
use proptest::prelude::*;

// =============================================================================
// Constants for bounding generated data
// =============================================================================

/// Maximum number of files in a generated config
pub const MAX_FILES: usize = 8;

/// Maximum number of rule names per file
pub const MAX_RULES_PER_FILE: usize = 4;

/// Maximum fixes and suggestions per finding
pub const MAX_FIXES: usize = 3;

/// Maximum number of fragments glued into one source text
pub const MAX_FRAGMENTS: usize = 24;

// =============================================================================
// Scalar Strategies
// =============================================================================

/// Strategy for free text including quotes, escapes and non-ASCII.
pub fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.\"\\\\/é€\n-]{0,40}"
}

/// Strategy for absolute TypeScript file paths.
pub fn arb_file_path() -> impl Strategy<Value = String> {
    "(/[a-z]{1,8}){1,4}\\.(ts|tsx|mts|cts)"
}

/// Strategy for kebab-case check names.
pub fn arb_rule_name() -> impl Strategy<Value = String> {
    "[a-z]{1,10}(-[a-z]{1,10}){0,3}"
}

pub fn arb_range() -> impl Strategy<Value = TextRange> {
    (0usize..100_000, 0usize..500).prop_map(|(pos, len)| TextRange::new(pos, pos + len))
}

pub fn arb_message() -> impl Strategy<Value = RuleMessage> {
    ("[a-zA-Z]{1,24}", arb_text()).prop_map(|(id, description)| RuleMessage { id, description })
}

pub fn arb_fix() -> impl Strategy<Value = Fix> {
    (arb_text(), arb_range()).prop_map(|(text, range)| Fix { text, range })
}

pub fn arb_suggestion() -> impl Strategy<Value = Suggestion> {
    (arb_message(), prop::collection::vec(arb_fix(), 0..MAX_FIXES))
        .prop_map(|(message, fixes)| Suggestion { message, fixes })
}

// =============================================================================
// Wire Strategies
// =============================================================================

/// Strategy for findings as they appear inside Finding frames.
pub fn arb_finding() -> impl Strategy<Value = Finding> {
    (
        arb_range(),
        arb_rule_name(),
        arb_message(),
        prop::collection::vec(arb_fix(), 0..MAX_FIXES),
        prop::collection::vec(arb_suggestion(), 0..MAX_FIXES),
        arb_file_path(),
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

pub fn arb_file_config() -> impl Strategy<Value = FileConfig> {
    (
        arb_file_path(),
        prop::collection::vec(arb_rule_name(), 0..MAX_RULES_PER_FILE),
    )
        .prop_map(|(file_path, rules)| FileConfig { file_path, rules })
}

/// Strategy for stdin config documents.
pub fn arb_config() -> impl Strategy<Value = HeadlessConfig> {
    prop::collection::vec(arb_file_config(), 0..MAX_FILES).prop_map(|files| HeadlessConfig { files })
}

// =============================================================================
// Source Strategies
// =============================================================================

/// Strategy for TypeScript-like source text that exercises every built-in
/// check as well as unterminated literals and comments.
pub fn arb_source_text() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("var x = 1;\n".to_string()),
        Just("let a: any = y as any;\n".to_string()),
        Just("debugger;\n".to_string()),
        Just("// @ts-ignore\n".to_string()),
        Just("/* @ts-nocheck */\n".to_string()),
        Just("const s = `a ${b} c`;\n".to_string()),
        Just("const r = /a[/]b/g;\n".to_string()),
        Just("'unterminated\n".to_string()),
        Just("/* open".to_string()),
        Just("const café = 'ü';\n".to_string()),
        "[ -~\n]{0,16}",
    ];
    prop::collection::vec(fragment, 0..MAX_FRAGMENTS).prop_map(|parts| parts.concat())
}
