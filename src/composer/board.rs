//! Assembled board configuration.

use std::collections::{BTreeMap, BTreeSet};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::fragment::Settings;

/// A feature declared on the board.
///
/// Declared either as a plain switch or as the set of enabled members, for
/// example the buses compiled in.
///
/// ```yaml
/// features:
///   ble: true
///   buses: [i2c, spi]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FeatureFlag {
    /// On or off.
    Switch(bool),
    /// Enabled members; an empty set means off.
    Set(BTreeSet<String>),
}

impl FeatureFlag {
    /// Whether the feature is on at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Switch(on) => *on,
            Self::Set(members) => !members.is_empty(),
        }
    }

    /// Whether `member` is enabled. A switched-on flag enables every member.
    #[must_use]
    pub fn enables(&self, member: &str) -> bool {
        match self {
            Self::Switch(on) => *on,
            Self::Set(members) => members.contains(member),
        }
    }
}

/// Identifier a feature name is exported under: ASCII alphanumerics upper
/// cased, anything else replaced with `_`.
///
/// Two features whose identifiers match cannot both be declared on a board.
///
/// ```rust
/// use boardsmith::composer::feature_ident;
///
/// assert_eq!(feature_ident("usb-cdc"), "USB_CDC");
/// assert_eq!(feature_ident("usb_cdc"), "USB_CDC");
/// ```
#[must_use]
pub fn feature_ident(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// The fully assembled, board-specific configuration.
///
/// Produced by [`Composer::assemble_board_config`](super::Composer::assemble_board_config)
/// and read-only afterwards. Two assemblies from identical inputs compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardConfig {
    pub(crate) board_id: u32,
    pub(crate) fragment_paths: Vec<Utf8PathBuf>,
    pub(crate) extra_flags: Vec<String>,
    pub(crate) manifest_path: Option<Utf8PathBuf>,
    pub(crate) feature_flags: BTreeMap<String, FeatureFlag>,
    pub(crate) settings: Settings,
}

impl BoardConfig {
    /// Numeric chip or board identifier.
    #[must_use]
    pub const fn board_id(&self) -> u32 {
        self.board_id
    }

    /// Fragments in overlay order.
    #[must_use]
    pub fn fragment_paths(&self) -> &[Utf8PathBuf] {
        &self.fragment_paths
    }

    /// Extra compiler flags, unchanged.
    #[must_use]
    pub fn extra_flags(&self) -> &[String] {
        &self.extra_flags
    }

    /// Frozen-module manifest, if any.
    #[must_use]
    pub fn manifest_path(&self) -> Option<&Utf8Path> {
        self.manifest_path.as_deref()
    }

    /// All declared features keyed by name.
    #[must_use]
    pub const fn feature_flags(&self) -> &BTreeMap<String, FeatureFlag> {
        &self.feature_flags
    }

    /// Look up a single feature.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&FeatureFlag> {
        self.feature_flags.get(name)
    }

    /// Settings merged from every fragment, last-write-wins.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Winning value for a fragment key.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key)
    }
}
