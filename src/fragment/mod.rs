//! Configuration fragment overlay.
//!
//! A fragment contributes `KEY=VALUE` lines to the board configuration.
//! Fragments are layered in declaration order (base, then feature, then
//! board-specific) and merged last-write-wins: when two fragments define the
//! same key, the one appearing later in the list supplies the value. The key
//! keeps the position of its first definition so rendered output is stable.
//!
//! Values are opaque. Only enough of each line is read to find its key:
//!
//! - blank lines and `#` comments are skipped;
//! - `KEY=VALUE` assigns the trimmed value verbatim, quotes included;
//! - `# KEY is not set` assigns [`DISABLED`];
//! - anything else is ignored and logged at debug level.
//!
//! ```rust
//! use boardsmith::fragment::{Fragment, merge};
//!
//! let base = Fragment::parse("base", "CONFIG_BT=y\nCONFIG_LOG=3\n");
//! let board = Fragment::parse("board", "# CONFIG_BT is not set\n");
//! let settings = merge([&base, &board]);
//! assert_eq!(settings.get("CONFIG_BT"), Some("n"));
//! assert_eq!(settings.get("CONFIG_LOG"), Some("3"));
//! ```

use std::fmt::{self, Display, Formatter};

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

mod store;

pub use store::{DirStore, FragmentStore, MemoryStore};

/// Value recorded for keys switched off with `# KEY is not set`.
pub const DISABLED: &str = "n";

const NOT_SET_SUFFIX: &str = " is not set";

/// One parsed configuration fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    path: Utf8PathBuf,
    entries: Vec<(String, String)>,
}

impl Fragment {
    /// Parse fragment text read from `path`.
    ///
    /// Parsing never fails; unrecognised lines are skipped.
    #[must_use]
    pub fn parse(path: impl Into<Utf8PathBuf>, text: &str) -> Self {
        let path = path.into();
        let entries = text
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                let entry = parse_line(line);
                if entry.is_none() && is_unrecognised(line) {
                    debug!(fragment = %path, line = idx + 1, "ignoring unrecognised fragment line");
                }
                entry
            })
            .collect();
        Self { path, entries }
    }

    /// Path the fragment was read from.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Key/value pairs in file order. Keys may repeat.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn is_key(candidate: &str) -> bool {
    !candidate.is_empty() && !candidate.contains(char::is_whitespace)
}

fn is_unrecognised(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if let Some(comment) = trimmed.strip_prefix('#') {
        return comment
            .trim()
            .strip_suffix(NOT_SET_SUFFIX)
            .map(str::trim)
            .filter(|key| is_key(key))
            .map(|key| (key.to_owned(), DISABLED.to_owned()));
    }
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    is_key(key).then(|| (key.to_owned(), value.trim().to_owned()))
}

/// The value that won for a key, and the fragment that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Setting {
    /// Opaque value text.
    pub value: String,
    /// Fragment that supplied the value.
    pub origin: Utf8PathBuf,
}

/// Merged settings keyed by name, in first-definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Settings(IndexMap<String, Setting>);

impl Settings {
    /// Apply `fragment` on top of the current settings.
    ///
    /// Keys already present take the fragment's value; new keys are appended.
    pub fn overlay(&mut self, fragment: &Fragment) {
        for (key, value) in fragment.entries() {
            if let Some(existing) = self.0.get_mut(key) {
                if existing.origin != fragment.path {
                    debug!(
                        key,
                        previous = %existing.origin,
                        fragment = %fragment.path,
                        "fragment overrides earlier value",
                    );
                }
                value.clone_into(&mut existing.value);
                existing.origin.clone_from(&fragment.path);
            } else {
                self.0.insert(
                    key.to_owned(),
                    Setting {
                        value: value.to_owned(),
                        origin: fragment.path.clone(),
                    },
                );
            }
        }
    }

    /// Winning value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.value.as_str())
    }

    /// Fragment that supplied the winning value for `key`.
    #[must_use]
    pub fn origin(&self, key: &str) -> Option<&Utf8Path> {
        self.0.get(key).map(|s| s.origin.as_path())
    }

    /// Iterate settings in first-definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Setting)> {
        self.0.iter().map(|(k, s)| (k.as_str(), s))
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no fragment defined any key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Writes the settings back out in fragment syntax.
///
/// A value of [`DISABLED`] is written in its comment form, `# KEY is not set`,
/// whether it was read that way or as `KEY=n`.
impl Display for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (key, setting) in &self.0 {
            if setting.value == DISABLED {
                writeln!(f, "# {key}{NOT_SET_SUFFIX}")?;
            } else {
                writeln!(f, "{key}={}", setting.value)?;
            }
        }
        Ok(())
    }
}

/// Merge fragments in order, last-write-wins.
pub fn merge<'a>(fragments: impl IntoIterator<Item = &'a Fragment>) -> Settings {
    fragments
        .into_iter()
        .fold(Settings::default(), |mut settings, fragment| {
            settings.overlay(fragment);
            settings
        })
}

/// Render merged settings as a standalone fragment file.
#[must_use]
pub fn render(settings: &Settings) -> String {
    format!("# Generated by boardsmith. Do not edit.\n{settings}")
}
