//! Errors raised while composing a build configuration.
//!
//! Every variant is fatal to the configuration pass and names the offending
//! unit or path so the invoking tool can report an actionable message.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use std::io;

use camino::Utf8PathBuf;
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

/// Errors produced by [`Composer`](super::Composer) operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ComposeError {
    /// A unit with this name was already registered.
    #[error("build unit '{name}' is already registered")]
    #[diagnostic(
        code(boardsmith::compose::duplicate_unit),
        help("unit names must be unique within a Boardfile")
    )]
    DuplicateUnit {
        /// The repeated unit name.
        name: String,
    },

    /// A unit name cannot be used as a library target.
    #[error("build unit name '{name}' is not a valid target name")]
    #[diagnostic(
        code(boardsmith::compose::invalid_unit_name),
        help("use only letters, digits, '_', '.', '+' and '-'")
    )]
    InvalidUnitName {
        /// The rejected name.
        name: String,
    },

    /// A unit was declared without any source files.
    #[error("build unit '{name}' has no source files")]
    #[diagnostic(code(boardsmith::compose::empty_sources))]
    EmptySourceList {
        /// The unit missing sources.
        name: String,
    },

    /// A link named one or more units that were never registered.
    #[error("unknown build unit(s): {}", .names.join(", "))]
    #[diagnostic(
        code(boardsmith::compose::unknown_unit),
        help("declare units before linking them")
    )]
    UnknownUnit {
        /// Every unregistered name referenced by the link.
        names: Vec<String>,
    },

    /// A unit was linked against itself.
    #[error("build unit '{name}' cannot link against itself")]
    #[diagnostic(code(boardsmith::compose::self_link))]
    SelfLink {
        /// The self-linked unit.
        name: String,
    },

    /// The declared links form a cycle.
    #[error("circular link detected: {}", .cycle.join(" -> "))]
    #[diagnostic(code(boardsmith::compose::circular_link))]
    CircularLink {
        /// Unit names along the cycle, starting and ending at the same unit.
        cycle: Vec<String>,
    },

    /// One or more configuration fragments do not exist.
    #[error("missing configuration fragment(s): {}", .paths.iter().join(", "))]
    #[diagnostic(
        code(boardsmith::compose::missing_fragment),
        help("fragment paths are resolved relative to the project root")
    )]
    MissingFragment {
        /// Every missing fragment, in declaration order.
        paths: Vec<Utf8PathBuf>,
    },

    /// Distinct feature names normalise to the same identifier.
    #[error("features '{}' all map to identifier '{ident}'", .names.join("', '"))]
    #[diagnostic(
        code(boardsmith::compose::feature_collision),
        help("feature names must differ after upper-casing and replacing punctuation with '_'")
    )]
    FeatureCollision {
        /// The shared identifier.
        ident: String,
        /// Every feature name mapping to it, in name order.
        names: Vec<String>,
    },

    /// The frozen-module manifest does not exist.
    #[error("frozen manifest '{path}' does not exist")]
    #[diagnostic(code(boardsmith::compose::missing_manifest))]
    MissingManifest {
        /// The manifest path as declared.
        path: Utf8PathBuf,
    },

    /// An existing fragment could not be read.
    #[error("failed to read configuration fragment '{path}'")]
    #[diagnostic(code(boardsmith::compose::fragment_read))]
    FragmentRead {
        /// The fragment being read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}
