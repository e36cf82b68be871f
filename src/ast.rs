//! Boardfile declaration structures.
//!
//! This module defines the data structures used to represent a parsed
//! `Boardfile`. Each section mirrors one kind of static declaration: build
//! units, the link edges between them, and the board assembly parameters.
//! They are deserialised with `serde-saphyr`.
//!
//! ```rust
//! use boardsmith::ast::{Boardfile, StringOrList};
//!
//! let yaml = "boardsmith_version: \"1.0.0\"\nunits:\n  - name: crypto\n    sources: aes.c\nboard:\n  id: 32";
//! let file: Boardfile = serde_saphyr::from_str(yaml).expect("parse");
//! assert_eq!(file.units[0].sources, StringOrList::String("aes.c".into()));
//! ```

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::composer::FeatureFlag;

/// Top-level declarations parsed from a `Boardfile`.
///
/// Optional collections default to empty. Declarations are applied in file
/// order, so a link may only name units declared in the `units` section.
///
/// ```yaml
/// boardsmith_version: "1.0.0"
/// units:
///   - name: crypto
///     sources: [lib/crypto/aes.c]
/// board:
///   id: 32
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Boardfile {
    /// Semantic version of the declaration format.
    pub boardsmith_version: Version,

    /// Build units registered with the composer.
    #[serde(default)]
    pub units: Vec<UnitDecl>,

    /// Dependencies between registered units.
    #[serde(default)]
    pub links: Vec<LinkDecl>,

    /// Board assembly parameters.
    pub board: BoardDecl,
}

/// A named build unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UnitDecl {
    /// Unique unit name, used as the library name downstream.
    pub name: String,
    /// Source files compiled into the unit, in order.
    #[serde(default)]
    pub sources: StringOrList,
    /// Include search directories exported by the unit.
    #[serde(default)]
    pub include_dirs: StringOrList,
}

/// Declares that `consumer` requires the artefacts of `dependency`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkDecl {
    /// Unit that consumes the dependency.
    pub consumer: String,
    /// Unit whose artefacts are required.
    pub dependency: String,
}

/// Parameters of the board target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BoardDecl {
    /// Numeric chip or board identifier.
    pub id: u32,
    /// Configuration fragments, base first. Later fragments override earlier
    /// ones.
    #[serde(default)]
    pub fragments: Vec<Utf8PathBuf>,
    /// Extra compiler flags passed through unchanged.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Frozen-module manifest for the firmware image.
    #[serde(default)]
    pub manifest: Option<Utf8PathBuf>,
    /// Named feature switches or enabled-sets.
    #[serde(default)]
    pub features: BTreeMap<String, FeatureFlag>,
}

/// A helper for fields that accept either a single string or a list of
/// strings.
///
/// It mirrors YAML syntax where a scalar or sequence is allowed. Empty values
/// deserialize to `StringOrList::Empty`.
///
/// ```yaml
/// # Scalar
/// sources: aes.c
/// # Sequence
/// sources:
///   - aes.c
///   - sha256.c
/// ```
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringOrList {
    /// No value provided.
    #[default]
    Empty,
    /// A single string item.
    String(String),
    /// A list of string items.
    List(Vec<String>),
}

impl StringOrList {
    /// Convert the value into an ordered list of paths.
    ///
    /// ```rust
    /// use boardsmith::ast::StringOrList;
    /// use camino::Utf8PathBuf;
    ///
    /// let list = StringOrList::List(vec!["a.c".into(), "b.c".into()]);
    /// assert_eq!(list.to_paths(), vec![Utf8PathBuf::from("a.c"), Utf8PathBuf::from("b.c")]);
    /// assert!(StringOrList::Empty.to_paths().is_empty());
    /// ```
    #[must_use]
    pub fn to_paths(&self) -> Vec<Utf8PathBuf> {
        match self {
            Self::Empty => Vec::new(),
            Self::String(s) => vec![Utf8PathBuf::from(s)],
            Self::List(v) => v.iter().map(Utf8PathBuf::from).collect(),
        }
    }
}
