//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads the Boardfile, runs the composer and hands the composition to the
//! requested emitter.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use camino::Utf8PathBuf;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use tracing::{debug, info};

use crate::boardfile::{self, BoardfileError};
use crate::cli::{Cli, Commands, ResolveArgs};
use crate::cmake_gen;
use crate::composer::{ComposeError, Composition, ConfigContext};
use crate::fragment;

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Returns an error if the Boardfile cannot be loaded, composition fails, or
/// the output cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or(Commands::Resolve(ResolveArgs { output: None }));
    let composition = compose(cli)?;
    match command {
        Commands::Resolve(ResolveArgs { output }) => {
            let json =
                serde_json::to_string_pretty(&composition).context("serialising composition")?;
            emit(cli, output.as_deref(), &format!("{json}\n"))
        }
        Commands::Cmake { file } => emit(cli, Some(file.as_path()), &cmake_gen::generate(&composition)),
        Commands::Sdkconfig { file } => emit(
            cli,
            Some(file.as_path()),
            &fragment::render(composition.board.settings()),
        ),
        Commands::Check => {
            let summary = format!(
                "ok: {} unit(s), {} link(s), {} setting(s), fingerprint {}\n",
                composition.units.len(),
                composition.links.len(),
                composition.board.settings().len(),
                composition.fingerprint,
            );
            emit(cli, None, &summary)
        }
    }
}

/// Load the Boardfile referenced by `cli` and compose it.
///
/// # Errors
///
/// Returns an error if the project directory is unusable, the Boardfile
/// cannot be parsed, or the composer rejects a declaration.
pub fn compose(cli: &Cli) -> Result<Composition> {
    let dir = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
    let root = fs::canonicalize(&dir)
        .with_context(|| format!("resolving project directory {}", dir.display()))
        .and_then(utf8)?;
    let path = root.join(utf8(cli.file.clone())?);
    let file =
        boardfile::from_path(&path).with_context(|| format!("loading Boardfile at {path}"))?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let json = serde_json::to_string_pretty(&file).context("serialising Boardfile")?;
        debug!("Boardfile:\n{json}");
    }
    let context =
        ConfigContext::open(root.clone()).with_context(|| format!("opening project root {root}"))?;
    let composition =
        boardfile::compose(&file, context).with_context(|| format!("composing {path}"))?;
    Ok(composition)
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|p| anyhow!("path {} is not valid UTF-8", p.display()))
}

/// Resolve an output path relative to the `-C` directory.
fn resolve_output_path(cli: &Cli, path: &Path) -> PathBuf {
    match &cli.directory {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

/// Write `content` to `path`, or to stdout when `path` is absent or `-`.
fn emit(cli: &Cli, path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) if path != Path::new("-") => {
            let target = resolve_output_path(cli, path);
            write_and_log(&target, content)
                .with_context(|| format!("writing {}", target.display()))
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .context("writing to stdout")
        }
    }
}

/// Write `content` to `path` and log the file's location.
fn write_and_log(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, content)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Render `err` for the terminal.
///
/// Composer and Boardfile failures are drawn as `miette` diagnostics with
/// their help text and source spans; other errors print their context chain.
#[must_use]
pub fn render_error(err: &anyhow::Error) -> String {
    let diagnostic: Option<&dyn Diagnostic> = err
        .downcast_ref::<ComposeError>()
        .map(|e| e as &dyn Diagnostic)
        .or_else(|| {
            err.downcast_ref::<BoardfileError>()
                .map(|e| e as &dyn Diagnostic)
        });
    let mut out = format!("{err:#}\n");
    if let Some(diagnostic) = diagnostic {
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
        let mut rendered = String::new();
        if handler.render_report(&mut rendered, diagnostic).is_ok() {
            out.push_str(&rendered);
        }
    }
    out
}
