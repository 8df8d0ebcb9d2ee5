use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};

use headlint_core::{EXIT_OK, FsProgramHost, HeadlessOptions, Linter, run_headless};
use headlint_domain::CheckRegistry;

#[derive(Parser)]
#[command(name = "headlint")]
#[command(version)]
#[command(
    about = "Run checks over a TypeScript project and stream findings as binary frames",
    long_about = None
)]
struct Cli {
    /// Project configuration file the program is built from.
    #[arg(long)]
    tsconfig: Option<PathBuf>,

    /// Base directory for resolving relative paths.
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Number of worker threads (default: available parallelism).
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Print the registered checks and exit.
    #[arg(long)]
    list_checks: bool,

    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long)]
    debug: bool,
}

fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // --help / --version go to stdout and succeed; real usage errors fail.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return Ok(code);
        }
    };

    init_logging(cli.verbose, cli.debug);

    let registry = CheckRegistry::builtin();

    if cli.list_checks {
        return cmd_list_checks(&registry, &mut io::stdout().lock());
    }

    let Some(tsconfig) = non_empty(cli.tsconfig) else {
        eprintln!("--tsconfig is required");
        return Ok(1);
    };
    let Some(cwd) = non_empty(cli.cwd) else {
        eprintln!("--cwd is required");
        return Ok(1);
    };

    let mut options = HeadlessOptions::new(tsconfig, cwd);
    if let Some(threads) = cli.threads {
        options = options.with_linter(Linter::new(threads));
    }
    info!(
        "Starting headless run: tsconfig={} cwd={} workers={}",
        options.tsconfig.display(),
        options.cwd.display(),
        options.linter.workers()
    );

    let stdin = io::stdin().lock();
    match run_headless(&FsProgramHost, &registry, &options, stdin, io::stdout()) {
        Ok(summary) => {
            debug!(
                "Completed: {} file(s), {} finding(s)",
                summary.files, summary.findings
            );
            Ok(EXIT_OK)
        }
        Err(err) => {
            error!("{}", err);
            Ok(err.exit_code())
        }
    }
}

/// An empty flag value counts as missing.
fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn cmd_list_checks(registry: &CheckRegistry, out: &mut impl Write) -> Result<i32> {
    for check in registry.iter() {
        writeln!(out, "{}\t{}", check.name(), check.description()).context("write check list")?;
    }
    out.flush().context("flush check list")?;
    Ok(0)
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries frames; logs go to stderr only.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
