//! Fuzz target for the tokenizer and the built-in checks.
//!
//! Tokens must cover the input in order without overlap, and every finding a
//! built-in check reports must lie inside the source text.

#![no_main]

use libfuzzer_sys::fuzz_target;

use headlint_domain::{CheckRegistry, lint_source, tokenize};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 20_000 {
        return;
    }

    let mut last_end = 0;
    for token in tokenize(text) {
        assert!(token.range.pos >= last_end);
        assert!(token.range.pos <= token.range.end);
        assert!(token.range.end <= text.len());
        last_end = token.range.end;
    }

    let registry = CheckRegistry::builtin();
    let checks: Vec<_> = registry.iter().cloned().collect();
    lint_source("/fuzz.ts", text, &checks, &mut |finding| {
        assert!(finding.range.end <= text.len());
        for fix in &finding.fixes {
            assert!(fix.range.end <= text.len());
        }
    });
});
