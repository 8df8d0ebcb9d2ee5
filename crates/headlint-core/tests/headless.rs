//! End-to-end tests for `run_headless` against in-memory and on-disk
//! programs.

use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headlint_core::{
    FrameWriter, FsProgramHost, HeadlessError, HeadlessOptions, Linter, Message, Pipeline,
    ProgramHost, run_headless,
};
use headlint_domain::CheckRegistry;
use headlint_testkit::{
    DEFAULT_TSCONFIG, NoFoo, PanicOn, ScriptedCheck, SharedBuffer, StaticHost, collect_errors,
    collect_findings, config_json, sample_sources, validate_payload, write_project,
};
use headlint_types::{MessageKind, TextRange};

fn registry_with_test_checks() -> CheckRegistry {
    CheckRegistry::builder()
        .with_builtins()
        .with_check(Arc::new(NoFoo))
        .with_check(Arc::new(ScriptedCheck::new(
            "scripted",
            [(10, 11), (5, 6), (20, 21)],
        )))
        .with_check(Arc::new(PanicOn { trigger: "boom" }))
        .build()
        .expect("test registry")
}

fn workers(n: usize) -> Linter {
    Linter::new(NonZeroUsize::new(n).expect("non-zero"))
}

fn run(host: &StaticHost, stdin: &str, linter: Linter) -> (Result<(), HeadlessError>, SharedBuffer) {
    let out = SharedBuffer::default();
    let options = HeadlessOptions::new("/tsconfig.json", "/").with_linter(linter);
    let result = run_headless(
        host,
        &registry_with_test_checks(),
        &options,
        stdin.as_bytes(),
        out.clone(),
    )
    .map(|_| ());
    (result, out)
}

#[test]
fn single_finding_end_to_end() {
    let host = StaticHost::new("/").with_file("/a.ts", sample_sources::FOO_IDENT_AT_3);
    let (result, out) = run(
        &host,
        r#"{"files":[{"file_path":"/a.ts","rules":["no-foo"]}]}"#,
        Linter::default(),
    );
    assert!(result.is_ok());

    let frames = out.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].kind, MessageKind::Finding);

    let json = String::from_utf8(frames[0].payload.clone()).unwrap();
    insta::assert_snapshot!(json, @r#"{"range":{"pos":3,"end":6},"rule":"no-foo","message":{"id":"no-foo-found","description":"foo is not allowed"},"fixes":[],"suggestions":[],"file_path":"/a.ts"}"#);

    let findings = collect_findings(&out.bytes());
    assert_eq!(findings[0].range, TextRange::new(3, 6));
    assert!(findings[0].fixes.is_empty());
    assert!(findings[0].suggestions.is_empty());
}

#[test]
fn one_check_keeps_report_order() {
    let host = StaticHost::new("/").with_file("/a.ts", "x".repeat(40));
    let (result, out) = run(
        &host,
        r#"{"files":[{"file_path":"/a.ts","rules":["scripted"]}]}"#,
        workers(4),
    );
    assert!(result.is_ok());

    let findings = collect_findings(&out.bytes());
    let ranges: Vec<_> = findings.iter().map(|f| (f.range.pos, f.message.description.as_str())).collect();
    assert_eq!(ranges, [(10, "finding 0"), (5, "finding 1"), (20, "finding 2")]);
}

#[test]
fn unresolved_file_means_no_findings() {
    let host = StaticHost::new("/")
        .with_file("/a.ts", "var a;")
        .with_file("/b.ts", "var b;");
    let (result, out) = run(
        &host,
        &config_json(&["/a.ts", "/b.ts", "/c.ts"], &["no-var"]),
        Linter::default(),
    );
    assert!(matches!(result, Err(HeadlessError::Bind(_))));
    assert!(collect_findings(&out.bytes()).is_empty());
    assert_eq!(
        collect_errors(&out.bytes()),
        ["file /c.ts is not matched by tsconfig"]
    );
}

#[test]
fn unknown_check_is_fatal_before_any_finding() {
    let host = StaticHost::new("/")
        .with_file("/big.ts", sample_sources::long_file(100))
        .with_file("/small.ts", "var s;");
    let stdin = r#"{"files":[
        {"file_path":"/big.ts","rules":["no-var"]},
        {"file_path":"/small.ts","rules":["no-var","not-a-check"]}
    ]}"#;
    let (result, out) = run(&host, stdin, Linter::default());

    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert_eq!(out.frames().len(), 1);
    assert_eq!(collect_errors(&out.bytes()), ["unknown rule: not-a-check"]);
}

#[test]
fn malformed_config() {
    let host = StaticHost::new("/").with_file("/a.ts", "x");
    let (result, out) = run(&host, r#"{"files": [{"rules": []}]}"#, Linter::default());
    assert!(result.is_err());
    let errors = collect_errors(&out.bytes());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("error parsing config: "), "{}", errors[0]);
}

#[test]
fn worker_panic_reports_after_drained_findings() {
    let host = StaticHost::new("/")
        .with_file("/boom.ts", "boom boom boom")
        .with_file("/a.ts", "foo");
    let stdin = r#"{"files":[
        {"file_path":"/boom.ts","rules":["panic-on"]},
        {"file_path":"/a.ts","rules":["no-foo"]}
    ]}"#;
    let (result, out) = run(&host, stdin, workers(2));
    assert!(matches!(result, Err(HeadlessError::Lint(_))));

    let messages = out.messages();
    let last = messages.last().expect("error frame");
    match last {
        Message::Error(e) => assert_eq!(
            e.error,
            "error running linter: worker panicked: check blew up on /boom.ts"
        ),
        Message::Finding(f) => panic!("expected trailing error frame, got {f:?}"),
    }
    assert_eq!(collect_errors(&out.bytes()).len(), 1);
}

#[test]
fn every_payload_validates_against_schema() {
    let host = StaticHost::new("/")
        .with_file("/every.ts", sample_sources::EVERY_CHECK)
        .with_file("/clean.ts", sample_sources::CLEAN);
    let (result, out) = run(
        &host,
        &config_json(
            &["/every.ts", "/clean.ts"],
            &["ban-ts-comment", "no-var", "no-explicit-any", "no-debugger"],
        ),
        Linter::default(),
    );
    assert!(result.is_ok());

    let frames = out.frames();
    assert_eq!(frames.len(), 4);
    for frame in &frames {
        validate_payload(frame.kind, &frame.payload).expect("payload matches schema");
    }

    let mut rules: Vec<_> = collect_findings(&out.bytes()).into_iter().map(|f| f.rule).collect();
    rules.sort();
    assert_eq!(rules, ["ban-ts-comment", "no-debugger", "no-explicit-any", "no-var"]);
}

/// Writer that is slow on every write call.
#[derive(Clone, Default)]
struct SlowSink(SharedBuffer);

impl Write for SlowSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        thread::sleep(Duration::from_micros(200));
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn back_pressure_bounds_pending_findings() {
    const CAPACITY: usize = 8;
    let sink = SlowSink::default();
    // Capacity 1 buffer: every frame reaches the slow sink.
    let pipeline = Pipeline::with_capacity(FrameWriter::with_capacity(1, sink.clone()), CAPACITY)
        .expect("pipeline");

    let mut max_pending = 0;
    let tx = pipeline.sender();
    for seq in 0..200 {
        tx.send(headlint_types::Finding {
            range: TextRange::new(seq, seq + 1),
            rule: "r".to_string(),
            message: headlint_types::RuleMessage::new("id", "d"),
            fixes: vec![],
            suggestions: vec![],
            file_path: "/a.ts".to_string(),
        });
        max_pending = max_pending.max(tx.pending());
    }
    drop(tx);

    assert!(max_pending <= CAPACITY, "pending reached {max_pending}");
    let drained = pipeline.finish().expect("drain");
    assert_eq!(drained.findings, 200);
    assert_eq!(collect_findings(&sink.0.bytes()).len(), 200);
}

/// Stdout that panics on its first write and works afterwards.
#[derive(Clone, Default)]
struct PanicsOnFirstWrite {
    tripped: Arc<std::sync::atomic::AtomicBool>,
    out: SharedBuffer,
}

impl Write for PanicsOnFirstWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.tripped.swap(true, std::sync::atomic::Ordering::SeqCst) {
            panic!("stdout write panicked");
        }
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn output_thread_panic_still_ends_with_error_frame() {
    let host = StaticHost::new("/").with_file("/a.ts", sample_sources::FOO_IDENT_AT_3);
    let stdout = PanicsOnFirstWrite::default();
    let result = run_headless(
        &host,
        &registry_with_test_checks(),
        &HeadlessOptions::new("/tsconfig.json", "/"),
        &br#"{"files":[{"file_path":"/a.ts","rules":["no-foo"]}]}"#[..],
        stdout.clone(),
    );

    let err = result.unwrap_err();
    assert!(err.is_reported());
    assert_eq!(err.exit_code(), 1);

    let messages = stdout.out.messages();
    assert_eq!(collect_errors(&stdout.out.bytes()), ["output thread panicked"]);
    assert!(matches!(messages.last(), Some(Message::Error(_))));
}

#[test]
fn filesystem_project_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tsconfig = write_project(
        dir.path(),
        DEFAULT_TSCONFIG,
        &[
            ("src/a.ts", sample_sources::ONE_VAR),
            ("src/b.ts", sample_sources::CLEAN),
            ("node_modules/dep/index.ts", "var ignored;"),
        ],
    );
    let cwd = dir.path().to_string_lossy().replace('\\', "/");
    let out = SharedBuffer::default();
    let options = HeadlessOptions::new(&tsconfig, dir.path());

    let result = run_headless(
        &FsProgramHost,
        &CheckRegistry::builtin(),
        &options,
        config_json(&["src/a.ts", "src/b.ts"], &["no-var"]).as_bytes(),
        out.clone(),
    );
    assert!(result.is_ok(), "{:?}", result.err());

    let findings = collect_findings(&out.bytes());
    assert_eq!(findings.len(), 1);
    assert!(findings[0].file_path.ends_with("/src/a.ts"));
    assert!(findings[0].file_path.starts_with(&cwd) || cfg!(windows));
}

#[test]
fn filesystem_project_excludes_node_modules() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tsconfig = write_project(
        dir.path(),
        DEFAULT_TSCONFIG,
        &[("a.ts", "var a;"), ("node_modules/dep/index.ts", "var b;")],
    );
    let program = FsProgramHost
        .create_program(&tsconfig, dir.path())
        .expect("program");
    let names: Vec<_> = program.source_files().map(|f| f.file_name()).collect();
    assert_eq!(names.len(), 1, "{names:?}");
    assert!(names[0].ends_with("/a.ts"));

    let out = SharedBuffer::default();
    let result = run_headless(
        &FsProgramHost,
        &CheckRegistry::builtin(),
        &HeadlessOptions::new(&tsconfig, dir.path()),
        config_json(&["node_modules/dep/index.ts"], &["no-var"]).as_bytes(),
        out.clone(),
    );
    assert!(matches!(result, Err(HeadlessError::Bind(_))));
    assert!(collect_errors(&out.bytes())[0].ends_with("is not matched by tsconfig"));
}

#[test]
fn missing_tsconfig_is_program_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = SharedBuffer::default();
    let result = run_headless(
        &FsProgramHost,
        &CheckRegistry::builtin(),
        &HeadlessOptions::new(dir.path().join("nope.json"), dir.path()),
        &b"{}"[..],
        out.clone(),
    );
    assert!(matches!(result, Err(HeadlessError::Program(_))));
    let errors = collect_errors(&out.bytes());
    assert!(errors[0].starts_with("error creating TS program: "));
}
