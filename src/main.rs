#![warn(clippy::all, rust_2018_idioms)]

use awsquery::cli;
use awsquery::error::ExitCode;
use awsquery::policy::PolicyGate;
use awsquery::run::{exit_code, run};
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    // Stdout is reserved for rendered output (§6); all logging, including
    // `--debug` trace lines, goes to stderr.
    let default_filter = if debug { "awsquery=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let debug = args.iter().any(|a| a == "-d" || a == "--debug");
    init_tracing(debug);

    tracing::debug!(git_branch = env!("GIT_BRANCH"), git_commit = env!("GIT_COMMIT"), "awsquery starting");

    let cmd = match cli::parse(args) {
        Ok(cmd) => cmd,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(ExitCode::Other.code());
        }
    };

    let policy = match PolicyGate::load() {
        Ok(policy) => policy,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(ExitCode::Other.code());
        }
    };

    let result = tokio::select! {
        result = run(cmd, &policy) => result,
        _ = tokio::signal::ctrl_c() => {
            // §5: a single process-level signal aborts all in-flight calls
            // and exits immediately; partial output is never emitted.
            std::process::exit(ExitCode::Interrupted.code());
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            if debug {
                eprintln!("[DEBUG] {err:?}");
            } else {
                eprintln!("error: {err}");
            }
            std::process::exit(exit_code(&err));
        }
    }
}
