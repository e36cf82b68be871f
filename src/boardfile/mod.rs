//! Boardfile loading and composition.
//!
//! A `Boardfile` is the YAML declaration of the build units, their links and
//! the board parameters. Loading it only parses and checks the schema;
//! [`compose`] then feeds the declarations through a
//! [`Composer`](crate::composer::Composer) in file order.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;

use crate::ast::Boardfile;
use crate::composer::{ComposeError, Composer, Composition, ConfigContext};

mod diagnostics;

pub use diagnostics::{BoardfileError, map_yaml_error};

/// Default file name looked up in the working directory.
pub const DEFAULT_NAME: &str = "Boardfile";

fn from_str_named(yaml: &str, name: &str) -> Result<Boardfile> {
    let file: Boardfile = serde_saphyr::from_str(yaml).map_err(|e| BoardfileError::Parse {
        source: map_yaml_error(e, yaml, name),
    })?;
    Ok(file)
}

/// Parse a Boardfile from a string.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or does not match the schema.
///
/// ```rust
/// let file = boardsmith::boardfile::from_str(
///     "boardsmith_version: \"1.0.0\"\nboard:\n  id: 32\n",
/// ).expect("parse");
/// assert_eq!(file.board.id, 32);
/// ```
pub fn from_str(yaml: &str) -> Result<Boardfile> {
    from_str_named(yaml, DEFAULT_NAME)
}

/// Load a Boardfile from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to parse.
pub fn from_path(path: impl AsRef<Utf8Path>) -> Result<Boardfile> {
    let path_ref = path.as_ref();
    let data = fs::read_to_string(path_ref).with_context(|| format!("failed to read {path_ref}"))?;
    from_str_named(&data, path_ref.as_str())
}

/// Register every declaration of `file` and assemble its board.
///
/// Units are registered first, then links, then the board, so a failure
/// names the first declaration that could not be applied.
///
/// # Errors
///
/// Returns the first [`ComposeError`] raised by the composer.
pub fn compose(file: &Boardfile, context: ConfigContext) -> Result<Composition, ComposeError> {
    let mut composer = Composer::new(context);
    for unit in &file.units {
        composer.register_unit(
            unit.name.clone(),
            unit.sources.to_paths(),
            unit.include_dirs.to_paths(),
        )?;
    }
    for link in &file.links {
        composer.link(&link.consumer, &link.dependency)?;
    }
    let board = &file.board;
    let config = composer.assemble_board_config(
        board.id,
        board.fragments.clone(),
        board.flags.clone(),
        board.manifest.clone(),
        board.features.clone(),
    )?;
    composer.compose(config)
}
