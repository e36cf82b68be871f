//! Configuration composer.
//!
//! The [`Composer`] registers build units, records the link edges between
//! them and assembles the board configuration. It performs no compilation:
//! the records are handed unchanged to a downstream build evaluator, usually
//! as a [`Composition`].
//!
//! All filesystem access goes through the explicit [`ConfigContext`] the
//! composer is created with; nothing is read from process-wide state.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use boardsmith::composer::{Composer, ConfigContext};
//! use boardsmith::fragment::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::default()
//!     .with_file("base.conf", "CONFIG_LOG=1\n")
//!     .with_file("board.conf", "CONFIG_LOG=3\n");
//! let mut composer = Composer::new(ConfigContext::new(".", store));
//! composer.register_unit("crypto", vec!["aes.c".into()], vec!["include".into()])?;
//! composer.register_unit("firmware", vec!["main.c".into()], Vec::new())?;
//! composer.link("firmware", "crypto")?;
//!
//! let board = composer.assemble_board_config(
//!     32,
//!     vec!["base.conf".into(), "board.conf".into()],
//!     Vec::new(),
//!     None,
//!     BTreeMap::new(),
//! )?;
//! assert_eq!(board.setting("CONFIG_LOG"), Some("3"));
//! # Ok(()) }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, info};

use crate::fragment::{self, DirStore, Fragment, FragmentStore};
use crate::hasher::ConfigHasher;

mod board;
mod error;
mod order;
mod unit;

pub use board::{BoardConfig, FeatureFlag, feature_ident};
pub use error::ComposeError;
pub use unit::{BuildUnit, LinkEdge};

/// Explicit configuration context passed to the composer.
///
/// Holds the project root and the store used to check and read fragments.
pub struct ConfigContext {
    root: Utf8PathBuf,
    store: Box<dyn FragmentStore>,
}

impl ConfigContext {
    /// Create a context over an arbitrary store.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, store: impl FragmentStore + 'static) -> Self {
        Self {
            root: root.into(),
            store: Box::new(store),
        }
    }

    /// Create a context reading from the directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if `root` cannot be opened.
    pub fn open(root: impl Into<Utf8PathBuf>) -> io::Result<Self> {
        let store = DirStore::open(root)?;
        let root = store.root().to_owned();
        Ok(Self::new(root, store))
    }

    /// Project root against which relative paths resolve.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Store used for existence checks and reads.
    #[must_use]
    pub fn store(&self) -> &dyn FragmentStore {
        self.store.as_ref()
    }
}

impl fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigContext")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Everything handed to the downstream build evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
    /// Project root of the composition.
    pub root: Utf8PathBuf,
    /// Units with every dependency ahead of its consumers.
    pub units: Vec<BuildUnit>,
    /// Link edges in declaration order.
    pub links: Vec<LinkEdge>,
    /// The assembled board configuration.
    pub board: BoardConfig,
    /// Digest of `board`; see [`ConfigHasher`].
    pub fingerprint: String,
}

/// Assembles build units, link edges and board configuration.
#[derive(Debug)]
pub struct Composer {
    context: ConfigContext,
    units: IndexMap<String, BuildUnit>,
    links: IndexSet<LinkEdge>,
}

impl Composer {
    /// Create an empty composer over `context`.
    #[must_use]
    pub fn new(context: ConfigContext) -> Self {
        Self {
            context,
            units: IndexMap::new(),
            links: IndexSet::new(),
        }
    }

    /// The context the composer reads through.
    #[must_use]
    pub const fn context(&self) -> &ConfigContext {
        &self.context
    }

    /// Register a build unit.
    ///
    /// Include directories are deduplicated; sources keep their order.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::InvalidUnitName`] if `name` is not a usable
    /// target name, [`ComposeError::DuplicateUnit`] if `name` is already
    /// registered, whatever its sources, and
    /// [`ComposeError::EmptySourceList`] if `sources` is empty.
    pub fn register_unit(
        &mut self,
        name: impl Into<String>,
        sources: Vec<Utf8PathBuf>,
        include_dirs: Vec<Utf8PathBuf>,
    ) -> Result<&BuildUnit, ComposeError> {
        let name = name.into();
        if !unit::is_valid_unit_name(&name) {
            return Err(ComposeError::InvalidUnitName { name });
        }
        match self.units.entry(name) {
            Entry::Occupied(slot) => Err(ComposeError::DuplicateUnit {
                name: slot.key().clone(),
            }),
            Entry::Vacant(slot) => {
                if sources.is_empty() {
                    return Err(ComposeError::EmptySourceList {
                        name: slot.into_key(),
                    });
                }
                let unit = BuildUnit::new(slot.key().clone(), sources, include_dirs);
                debug!(unit = unit.name(), sources = unit.sources().len(), "registered build unit");
                Ok(&*slot.insert(unit))
            }
        }
    }

    /// Declare that `consumer` requires the artefacts of `dependency`.
    ///
    /// Declaring an existing edge again returns it without adding a copy.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::SelfLink`] if both names are equal, and
    /// [`ComposeError::UnknownUnit`] listing every name that is not
    /// registered.
    pub fn link(&mut self, consumer: &str, dependency: &str) -> Result<LinkEdge, ComposeError> {
        if consumer == dependency {
            return Err(ComposeError::SelfLink {
                name: consumer.to_owned(),
            });
        }
        let unknown: Vec<String> = [consumer, dependency]
            .into_iter()
            .filter(|name| !self.units.contains_key(*name))
            .map(str::to_owned)
            .collect();
        if !unknown.is_empty() {
            return Err(ComposeError::UnknownUnit { names: unknown });
        }
        let edge = LinkEdge::new(consumer.to_owned(), dependency.to_owned());
        if self.links.insert(edge.clone()) {
            debug!(consumer, dependency, "linked build units");
        } else {
            debug!(consumer, dependency, "link already declared");
        }
        Ok(edge)
    }

    /// Look up a registered unit.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&BuildUnit> {
        self.units.get(name)
    }

    /// Registered units in registration order.
    pub fn units(&self) -> impl Iterator<Item = &BuildUnit> {
        self.units.values()
    }

    /// Declared link edges in declaration order.
    pub fn links(&self) -> impl Iterator<Item = &LinkEdge> {
        self.links.iter()
    }

    /// Direct dependencies of `consumer`, in declaration order.
    pub fn dependencies_of<'a>(&'a self, consumer: &'a str) -> impl Iterator<Item = &'a str> {
        self.links
            .iter()
            .filter(move |edge| edge.consumer() == consumer)
            .map(LinkEdge::dependency)
    }

    /// Units ordered so every dependency precedes its consumers.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::CircularLink`] if the links form a cycle.
    pub fn link_order(&self) -> Result<Vec<&BuildUnit>, ComposeError> {
        order::link_order(&self.units, &self.links)
    }

    /// Assemble the board configuration.
    ///
    /// Every fragment is checked for existence before any is read, so all
    /// missing paths are reported together. Fragments are then merged
    /// last-write-wins in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::FeatureCollision`] if two feature names share
    /// an identifier (see [`feature_ident`]),
    /// [`ComposeError::MissingFragment`] naming every missing fragment, [`ComposeError::MissingManifest`] if `manifest_path` does
    /// not exist, and [`ComposeError::FragmentRead`] if a fragment cannot be
    /// read.
    pub fn assemble_board_config(
        &self,
        board_id: u32,
        fragment_paths: Vec<Utf8PathBuf>,
        extra_flags: Vec<String>,
        manifest_path: Option<Utf8PathBuf>,
        feature_flags: BTreeMap<String, FeatureFlag>,
    ) -> Result<BoardConfig, ComposeError> {
        check_feature_idents(&feature_flags)?;
        let store = self.context.store();
        let missing: Vec<Utf8PathBuf> = fragment_paths
            .iter()
            .filter(|path| !store.exists(path))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ComposeError::MissingFragment { paths: missing });
        }
        if let Some(path) = manifest_path.as_ref().filter(|path| !store.exists(path)) {
            return Err(ComposeError::MissingManifest { path: path.clone() });
        }

        let fragments = fragment_paths
            .iter()
            .map(|path| {
                store
                    .read(path)
                    .map(|text| Fragment::parse(path.clone(), &text))
                    .map_err(|source| ComposeError::FragmentRead {
                        path: path.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let settings = fragment::merge(&fragments);
        debug!(
            board_id,
            fragments = fragments.len(),
            settings = settings.len(),
            "assembled board configuration",
        );

        Ok(BoardConfig {
            board_id,
            fragment_paths,
            extra_flags,
            manifest_path,
            feature_flags,
            settings,
        })
    }

    /// Finish composition with the assembled `board`.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::CircularLink`] if the links form a cycle.
    pub fn compose(self, board: BoardConfig) -> Result<Composition, ComposeError> {
        let units: Vec<BuildUnit> = self.link_order()?.into_iter().cloned().collect();
        let fingerprint = ConfigHasher::hash(&board);
        info!(board_id = board.board_id(), %fingerprint, "composition complete");
        Ok(Composition {
            root: self.context.root,
            units,
            links: self.links.into_iter().collect(),
            board,
            fingerprint,
        })
    }
}

fn check_feature_idents(features: &BTreeMap<String, FeatureFlag>) -> Result<(), ComposeError> {
    let mut by_ident: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in features.keys() {
        by_ident
            .entry(feature_ident(name))
            .or_default()
            .push(name.clone());
    }
    match by_ident.into_iter().find(|(_, names)| names.len() > 1) {
        Some((ident, names)) => Err(ComposeError::FeatureCollision { ident, names }),
        None => Ok(()),
    }
}
