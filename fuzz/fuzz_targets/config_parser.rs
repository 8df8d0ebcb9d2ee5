//! Fuzz target for stdin config parsing.
//!
//! Arbitrary bytes must either parse into a `HeadlessConfig` or produce a
//! `ConfigError`, never panic. Structured inputs exercise the merge of
//! duplicate file entries once parsing succeeds.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use headlint_core::{Program, bind_files, parse_config};

#[derive(Arbitrary, Debug)]
struct FuzzConfig {
    use_structured: bool,
    raw_bytes: Vec<u8>,
    entries: Vec<FuzzEntry>,
}

#[derive(Arbitrary, Debug)]
struct FuzzEntry {
    file: u8,
    rules: Vec<String>,
}

impl FuzzConfig {
    fn to_json(&self) -> Vec<u8> {
        let files: Vec<serde_json::Value> = self
            .entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "file_path": format!("/f{}.ts", e.file % 4),
                    "rules": e.rules,
                })
            })
            .collect();
        serde_json::json!({ "files": files }).to_string().into_bytes()
    }
}

fuzz_target!(|input: FuzzConfig| {
    let bytes = if input.use_structured {
        input.to_json()
    } else {
        if input.raw_bytes.len() > 10_000 {
            return;
        }
        input.raw_bytes
    };

    let Ok(config) = parse_config(&bytes) else {
        return;
    };

    let program = Program::from_sources("/", (0..4).map(|i| (format!("/f{i}.ts"), "x")));
    if let Ok(bound) = bind_files(&program, &config) {
        assert!(bound.len() <= config.files.len());
        for file in &bound {
            let mut seen = std::collections::HashSet::new();
            assert!(file.rules.iter().all(|r| seen.insert(r)), "rules not deduplicated");
        }
    }
});
