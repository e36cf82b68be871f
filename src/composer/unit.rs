//! Build unit and link edge records.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use serde::Serialize;

/// A named, independently compilable set of sources plus include paths.
///
/// Units are created by [`Composer::register_unit`](super::Composer::register_unit)
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildUnit {
    name: String,
    sources: Vec<Utf8PathBuf>,
    include_dirs: IndexSet<Utf8PathBuf>,
}

impl BuildUnit {
    /// Build a unit, deduplicating include directories in first-seen order.
    pub(crate) fn new(
        name: String,
        sources: Vec<Utf8PathBuf>,
        include_dirs: impl IntoIterator<Item = Utf8PathBuf>,
    ) -> Self {
        Self {
            name,
            sources,
            include_dirs: include_dirs.into_iter().collect(),
        }
    }

    /// Unit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source files in declaration order. Never empty.
    #[must_use]
    pub fn sources(&self) -> &[Utf8PathBuf] {
        &self.sources
    }

    /// Distinct include directories in first-declared order.
    pub fn include_dirs(&self) -> impl Iterator<Item = &Utf8Path> {
        self.include_dirs.iter().map(Utf8PathBuf::as_path)
    }
}

/// Whether `name` can serve as a library target name downstream.
///
/// Names are non-empty and use only ASCII alphanumerics, `_`, `.`, `+` and
/// `-`.
pub(crate) fn is_valid_unit_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-'))
}

/// A dependency of one unit's output on another's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LinkEdge {
    consumer: String,
    dependency: String,
}

impl LinkEdge {
    pub(crate) const fn new(consumer: String, dependency: String) -> Self {
        Self {
            consumer,
            dependency,
        }
    }

    /// Unit that requires the dependency.
    #[must_use]
    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    /// Unit whose artefacts are required.
    #[must_use]
    pub fn dependency(&self) -> &str {
        &self.dependency
    }
}
