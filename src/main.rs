//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use boardsmith::{cli::Cli, runner};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let cli = Cli::parse_with_default();
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    };
    fmt().with_max_level(max_level).with_writer(io::stderr).init();
    match runner::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "runner failed");
            let report = runner::render_error(&err);
            if io::stderr().lock().write_all(report.as_bytes()).is_err() {
                tracing::error!(error = %err, "runner failed");
            }
            ExitCode::FAILURE
        }
    }
}
