//! CMake snippet generator.
//!
//! This module converts a [`Composition`] into a CMake fragment the firmware
//! build can `include()`. Each unit becomes an `INTERFACE` library, links
//! become `target_link_libraries` calls, and the board configuration becomes
//! plain variables. Units are emitted in link order and every collection is
//! already ordered, so the output is deterministic.
//!
//! Relative paths are written under `${BOARDSMITH_ROOT}`, which the snippet
//! sets to the project root. Unit names and feature identifiers are checked
//! by the composer, so they are written unquoted.

use std::fmt::{self, Display, Formatter};

use camino::Utf8Path;

use crate::composer::{BuildUnit, Composition, FeatureFlag, feature_ident};

/// Name of the variable holding the project root.
pub const ROOT_VAR: &str = "BOARDSMITH_ROOT";

/// Generate the CMake snippet as a string.
#[must_use]
pub fn generate(composition: &Composition) -> String {
    Script(composition).to_string()
}

/// Escape text for a quoted CMake argument.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
}

fn quote(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

fn quote_path(path: &Utf8Path) -> String {
    if path.is_absolute() {
        quote(path.as_str())
    } else {
        format!("\"${{{ROOT_VAR}}}/{}\"", escape(path.as_str()))
    }
}

/// Variable name for a feature; see [`feature_ident`].
fn feature_var(name: &str) -> String {
    format!("BOARD_FEATURE_{}", feature_ident(name))
}

fn write_block(
    f: &mut Formatter<'_>,
    head: &str,
    items: impl IntoIterator<Item = String>,
) -> fmt::Result {
    writeln!(f, "{head}")?;
    for item in items {
        writeln!(f, "    {item}")?;
    }
    writeln!(f, ")")
}

struct Script<'a>(&'a Composition);

impl Display for Script<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let composition = self.0;
        writeln!(f, "# Generated by boardsmith. Do not edit.")?;
        writeln!(f, "# fingerprint: {}", composition.fingerprint)?;
        writeln!(f, "set({ROOT_VAR} {})", quote(composition.root.as_str()))?;
        for unit in &composition.units {
            writeln!(f)?;
            write!(f, "{}", DisplayUnit { composition, unit })?;
        }
        writeln!(f)?;
        write!(f, "{}", DisplayBoard(composition))
    }
}

struct DisplayUnit<'a> {
    composition: &'a Composition,
    unit: &'a BuildUnit,
}

impl Display for DisplayUnit<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = self.unit.name();
        writeln!(f, "add_library({name} INTERFACE)")?;
        write_block(
            f,
            &format!("target_sources({name} INTERFACE"),
            self.unit.sources().iter().map(|p| quote_path(p)),
        )?;
        let includes: Vec<String> = self.unit.include_dirs().map(quote_path).collect();
        if !includes.is_empty() {
            write_block(
                f,
                &format!("target_include_directories({name} INTERFACE"),
                includes,
            )?;
        }
        let deps: Vec<&str> = self
            .composition
            .links
            .iter()
            .filter(|edge| edge.consumer() == name)
            .map(|edge| edge.dependency())
            .collect();
        if !deps.is_empty() {
            writeln!(f, "target_link_libraries({name} INTERFACE {})", deps.join(" "))?;
        }
        Ok(())
    }
}

struct DisplayBoard<'a>(&'a Composition);

impl Display for DisplayBoard<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let board = &self.0.board;
        writeln!(f, "set(BOARD_ID {})", board.board_id())?;
        if !board.fragment_paths().is_empty() {
            write_block(
                f,
                "set(SDKCONFIG_DEFAULTS",
                board.fragment_paths().iter().map(|p| quote_path(p)),
            )?;
        }
        if !board.extra_flags().is_empty() {
            write_block(
                f,
                "set(BOARD_EXTRA_FLAGS",
                board.extra_flags().iter().map(|flag| quote(flag)),
            )?;
        }
        if let Some(manifest) = board.manifest_path() {
            writeln!(f, "set(FROZEN_MANIFEST {})", quote_path(manifest))?;
        }
        for (name, flag) in board.feature_flags() {
            let value = match flag {
                FeatureFlag::Switch(true) => "ON".to_owned(),
                FeatureFlag::Switch(false) => "OFF".to_owned(),
                FeatureFlag::Set(members) => {
                    quote(&members.iter().map(String::as_str).collect::<Vec<_>>().join(";"))
                }
            };
            writeln!(f, "set({} {value})", feature_var(name))?;
        }
        Ok(())
    }
}
