//! Common test fixtures for headlint.
//!
//! Sample sources with known findings, and helpers that lay out a project
//! on disk for tests that drive the real filesystem host or the binary.

use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Sample Sources
// =============================================================================

/// TypeScript snippets with a known number of built-in findings.
pub mod sample_sources {
    /// No findings for any built-in check.
    pub const CLEAN: &str = "export const answer: number = 42;\n";

    /// One `no-var` finding.
    pub const ONE_VAR: &str = "var legacy = 1;\n";

    /// One finding for each built-in check, in document order:
    /// `ban-ts-comment`, `no-var`, `no-explicit-any`, `no-debugger`.
    pub const EVERY_CHECK: &str = "// @ts-ignore\nvar value: any = load();\ndebugger;\n";

    /// Text long enough to be scheduled before the other samples.
    pub fn long_file(statements: usize) -> String {
        let mut out = String::new();
        for i in 0..statements {
            out.push_str(&format!("var v{i} = {i};\n"));
        }
        out
    }

    /// `foo` identifier at byte offsets 3..6.
    pub const FOO_IDENT_AT_3: &str = "if(foo) {}\n";
}

// =============================================================================
// On-disk projects
// =============================================================================

/// Default project file: every TypeScript file under the project root.
pub const DEFAULT_TSCONFIG: &str = r#"{
  // written by headlint-testkit
  "compilerOptions": { "strict": true, },
  "include": ["**/*"],
}
"#;

/// Write `tsconfig` and `files` (relative path, contents) under `dir`.
///
/// Returns the path of the project file.
pub fn write_project(dir: &Path, tsconfig: &str, files: &[(&str, &str)]) -> PathBuf {
    let config_path = dir.join("tsconfig.json");
    fs::write(&config_path, tsconfig).expect("write tsconfig");
    for (rel, text) in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create source dir");
        }
        fs::write(&path, text).expect("write source");
    }
    config_path
}

/// stdin document enabling `rules` for each absolute path in `paths`.
pub fn config_json(paths: &[&str], rules: &[&str]) -> String {
    let files: Vec<serde_json::Value> = paths
        .iter()
        .map(|p| serde_json::json!({ "file_path": p, "rules": rules }))
        .collect();
    serde_json::json!({ "files": files }).to_string()
}
