//! Conformance tests for the headless frame protocol.
//!
//! These drive the built `headlint` binary over small on-disk projects and
//! check the stdout stream against the shipped JSON schemas and the exit
//! code contract.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result, bail};
use headlint_core::{Frame, decode_all};
use headlint_types::{
    ErrorPayload, Finding, HeadlessConfig, KIND_ERROR, KIND_FINDING, MessageKind,
};
use schemars::schema::RootSchema;
use schemars::schema_for;
use tempfile::TempDir;

const TSCONFIG: &str = r#"{
  // conformance project
  "include": ["src/**/*"],
}
"#;

const SOURCE: &str = "// @ts-ignore\nvar value: any = load();\ndebugger;\n";

const ALL_RULES: [&str; 4] = ["ban-ts-comment", "no-debugger", "no-explicit-any", "no-var"];

/// Schemas generated from the wire types, keyed by their file name under `schemas/`.
pub fn generated_schemas() -> Vec<(&'static str, RootSchema)> {
    vec![
        ("headlint.config.schema.json", schema_for!(HeadlessConfig)),
        ("headlint.finding.schema.json", schema_for!(Finding)),
        ("headlint.error.schema.json", schema_for!(ErrorPayload)),
    ]
}

/// Run all conformance tests.
pub fn run_conformance(quick: bool) -> Result<()> {
    println!("Running headlint conformance tests...\n");

    let binary = build_binary()?;
    let tests: Vec<(&str, Box<dyn Fn() -> Result<()> + '_>)> = vec![
        ("Wire constants", Box::new(test_wire_constants)),
        ("Payload schema validation", Box::new(|| test_payload_schemas(&binary))),
        ("Fatal error is the last frame", Box::new(|| test_fatal_error_last(&binary))),
        ("Usage errors keep stdout empty", Box::new(|| test_usage_error(&binary))),
        ("Schema drift", Box::new(test_schema_drift)),
        ("Determinism", Box::new(|| test_determinism(&binary))),
    ];

    let total = tests.len();
    let mut passed = 0;
    let mut failed = 0;

    for (i, (name, test)) in tests.iter().enumerate() {
        if quick && *name == "Determinism" {
            println!("  [{}/{total}] {name}... SKIP (quick mode)", i + 1);
            continue;
        }
        print!("  [{}/{total}] {name}... ", i + 1);
        match test() {
            Ok(()) => {
                println!("PASS");
                passed += 1;
            }
            Err(e) => {
                println!("FAIL: {e}");
                failed += 1;
            }
        }
    }

    println!("\n{passed} passed, {failed} failed");
    if failed > 0 {
        bail!("{failed} conformance test(s) failed");
    }
    Ok(())
}

/// Frame kind bytes are part of the wire contract.
fn test_wire_constants() -> Result<()> {
    if KIND_ERROR != 0 || KIND_FINDING != 1 {
        bail!("kind bytes changed: error={KIND_ERROR} finding={KIND_FINDING}");
    }
    if MessageKind::from_byte(KIND_FINDING) != Some(MessageKind::Finding) {
        bail!("finding kind does not round-trip");
    }
    Ok(())
}

/// Every frame the binary writes validates against the shipped schema for its kind.
fn test_payload_schemas(binary: &Path) -> Result<()> {
    let project = Project::new()?;
    let output = project.run(binary, &project.config(&ALL_RULES), &[])?;

    if output.status.code() != Some(0) {
        bail!(
            "expected exit 0, got {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let frames = decode_all(&output.stdout).context("decode stdout frames")?;
    if frames.len() != ALL_RULES.len() {
        bail!("expected {} findings, got {} frames", ALL_RULES.len(), frames.len());
    }

    let finding_schema = load_schema("headlint.finding.schema.json")?;
    let error_schema = load_schema("headlint.error.schema.json")?;
    for frame in &frames {
        let value: serde_json::Value =
            serde_json::from_slice(&frame.payload).context("parse frame payload")?;
        let schema = match frame.kind {
            MessageKind::Finding => &finding_schema,
            MessageKind::Error => &error_schema,
        };
        if let Err(errors) = schema.validate(&value) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            bail!("payload failed schema validation:\n{}", messages.join("\n"));
        }
    }
    Ok(())
}

/// A fatal error produces exactly one Error frame, after every finding, and exit 1.
fn test_fatal_error_last(binary: &Path) -> Result<()> {
    let project = Project::new()?;
    let config = serde_json::json!({
        "files": [
            { "file_path": "src/a.ts", "rules": ["no-var"] },
            { "file_path": "src/missing.ts", "rules": ["no-var"] },
        ]
    })
    .to_string();
    let output = project.run(binary, &config, &[])?;

    if output.status.code() != Some(1) {
        bail!("expected exit 1, got {:?}", output.status.code());
    }

    let frames = decode_all(&output.stdout).context("decode stdout frames")?;
    let errors: Vec<&Frame> = frames
        .iter()
        .filter(|f| f.kind == MessageKind::Error)
        .collect();
    if errors.len() != 1 {
        bail!("expected one error frame, got {}", errors.len());
    }
    if frames.last().map(|f| f.kind) != Some(MessageKind::Error) {
        bail!("error frame is not the last frame");
    }

    let payload: ErrorPayload =
        serde_json::from_slice(&errors[0].payload).context("parse error payload")?;
    if !payload.error.ends_with("is not matched by tsconfig") {
        bail!("unexpected error message: {}", payload.error);
    }
    Ok(())
}

/// Missing flags are reported on stderr, never as frames.
fn test_usage_error(binary: &Path) -> Result<()> {
    let output = Command::new(binary)
        .stdin(Stdio::null())
        .output()
        .context("run headlint")?;

    if output.status.code() != Some(1) {
        bail!("expected exit 1, got {:?}", output.status.code());
    }
    if !output.stdout.is_empty() {
        bail!("usage error wrote {} byte(s) to stdout", output.stdout.len());
    }
    if !String::from_utf8_lossy(&output.stderr).contains("--tsconfig is required") {
        bail!("stderr does not name the missing flag");
    }
    Ok(())
}

/// The checked-in schemas match what the wire types generate.
fn test_schema_drift() -> Result<()> {
    for (name, generated) in generated_schemas() {
        let path = schemas_dir()?.join(name);
        if !path.exists() {
            bail!(
                "schema not found at {}. Run `cargo run -p xtask -- schema` first.",
                path.display()
            );
        }
        let shipped: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).context("read schema")?)
                .context("parse schema")?;
        let generated = serde_json::to_value(&generated).context("serialize schema")?;

        let shipped_canonical = canonicalize_json(&shipped)?;
        let generated_canonical = canonicalize_json(&generated)?;
        if shipped_canonical != generated_canonical {
            let first_diff = generated_canonical
                .lines()
                .zip(shipped_canonical.lines())
                .enumerate()
                .find(|(_, (a, b))| a != b)
                .map(|(i, (a, b))| {
                    format!(
                        "first divergence at line {}:\n  generated: {}\n  shipped:   {}",
                        i + 1,
                        a,
                        b
                    )
                })
                .unwrap_or_else(|| "files differ in length".to_string());
            bail!(
                "schema drift detected in schemas/{name}\n\n{first_diff}\n\n\
                 If the change is intentional, run `cargo run -p xtask -- schema`."
            );
        }
    }
    Ok(())
}

/// The multiset of frames is identical across runs and worker counts.
///
/// Global frame order across files is not part of the contract, so frames are
/// compared after sorting.
fn test_determinism(binary: &Path) -> Result<()> {
    let project = Project::new()?;
    let config = project.config(&ALL_RULES);

    let mut baseline: Option<Vec<(u8, Vec<u8>)>> = None;
    for threads in ["1", "2", "4", "8", "1"] {
        let output = project.run(binary, &config, &["--threads", threads])?;
        if output.status.code() != Some(0) {
            bail!("run with {threads} thread(s) failed");
        }
        let mut frames: Vec<(u8, Vec<u8>)> = decode_all(&output.stdout)
            .context("decode stdout frames")?
            .into_iter()
            .map(|f| (f.kind.as_byte(), f.payload))
            .collect();
        frames.sort();

        match &baseline {
            None => baseline = Some(frames),
            Some(first) if *first != frames => {
                bail!("run with {threads} thread(s) produced different frames")
            }
            Some(_) => {}
        }
    }
    Ok(())
}

// Helper functions

/// Re-serializes a JSON value with sorted keys.
fn canonicalize_json(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("re-serialize json")
}

fn schemas_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join("schemas"))
}

fn load_schema(name: &str) -> Result<jsonschema::JSONSchema> {
    let path = schemas_dir()?.join(name);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text).context("parse schema file")?;
    jsonschema::JSONSchema::compile(&value).map_err(|e| anyhow::anyhow!("{e}"))
}

/// Build the binary and return its path under target/debug.
fn build_binary() -> Result<PathBuf> {
    let status = Command::new("cargo")
        .args(["build", "-p", "headlint"])
        .status()
        .context("build headlint")?;
    if !status.success() {
        bail!("failed to build headlint");
    }

    Ok(std::env::current_dir()?
        .join("target")
        .join("debug")
        .join(if cfg!(windows) {
            "headlint.exe"
        } else {
            "headlint"
        }))
}

/// Temporary project with one source file per built-in check.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Result<Self> {
        let dir = TempDir::new().context("create temp dir")?;
        std::fs::write(dir.path().join("tsconfig.json"), TSCONFIG)?;
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src)?;
        std::fs::write(src.join("a.ts"), SOURCE)?;
        std::fs::write(src.join("b.ts"), "export const ok = 1;\n")?;
        Ok(Self { dir })
    }

    fn config(&self, rules: &[&str]) -> String {
        serde_json::json!({
            "files": [
                { "file_path": "src/a.ts", "rules": rules },
                { "file_path": "src/b.ts", "rules": rules },
            ]
        })
        .to_string()
    }

    fn run(&self, binary: &Path, stdin: &str, extra: &[&str]) -> Result<Output> {
        let mut child = Command::new(binary)
            .arg("--tsconfig")
            .arg(self.dir.path().join("tsconfig.json"))
            .arg("--cwd")
            .arg(self.dir.path())
            .args(extra)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("spawn headlint")?;

        child
            .stdin
            .take()
            .context("headlint stdin")?
            .write_all(stdin.as_bytes())
            .context("write config to stdin")?;

        child.wait_with_output().context("wait for headlint")
    }
}
