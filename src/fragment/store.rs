//! Filesystem access for fragments and manifests.
//!
//! [`DirStore`] resolves plain relative paths through a `cap-std` directory
//! handle rooted at the project root. Absolute paths, and relative paths that
//! climb out of the root with `..`, open their parent directory with ambient
//! authority instead, so a fragment shared between projects is found rather
//! than reported missing.

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};

/// Read access to configuration files.
pub trait FragmentStore {
    /// Whether `path` names an existing regular file.
    fn exists(&self, path: &Utf8Path) -> bool;

    /// Read `path` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the file cannot be opened or read.
    fn read(&self, path: &Utf8Path) -> io::Result<String>;
}

/// Store backed by a directory on disk.
#[derive(Debug)]
pub struct DirStore {
    root: Utf8PathBuf,
    dir: Dir,
}

impl DirStore {
    /// Open the project root.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if `root` is not an accessible directory.
    pub fn open(root: impl Into<Utf8PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let dir = Dir::open_ambient_dir(&root, ambient_authority())?;
        Ok(Self { root, dir })
    }

    /// Root directory the store was opened at.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path to open with ambient authority, or `None` when `path` stays
    /// inside the root handle.
    fn ambient_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        if path.is_absolute() {
            Some(path.to_owned())
        } else if path
            .components()
            .any(|c| matches!(c, Utf8Component::ParentDir))
        {
            Some(self.root.join(path))
        } else {
            None
        }
    }
}

struct ParentDir {
    handle: Dir,
    entry: String,
}

fn open_parent(path: &Utf8Path) -> io::Result<ParentDir> {
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let handle = Dir::open_ambient_dir(parent, ambient_authority())?;
    let entry = path.file_name().map_or_else(|| ".".into(), str::to_owned);
    Ok(ParentDir { handle, entry })
}

impl FragmentStore for DirStore {
    fn exists(&self, path: &Utf8Path) -> bool {
        match self.ambient_path(path) {
            Some(full) => {
                open_parent(&full).is_ok_and(|parent| parent.handle.is_file(&parent.entry))
            }
            None => self.dir.is_file(path),
        }
    }

    fn read(&self, path: &Utf8Path) -> io::Result<String> {
        match self.ambient_path(path) {
            Some(full) => {
                let parent = open_parent(&full)?;
                parent.handle.read_to_string(&parent.entry)
            }
            None => self.dir.read_to_string(path),
        }
    }
}

/// Store holding fragment text in memory.
///
/// ```rust
/// use boardsmith::fragment::{FragmentStore, MemoryStore};
/// use camino::Utf8Path;
///
/// let store = MemoryStore::default().with_file("base.conf", "X=1\n");
/// assert!(store.exists(Utf8Path::new("base.conf")));
/// assert!(!store.exists(Utf8Path::new("other.conf")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<Utf8PathBuf, String>,
}

impl MemoryStore {
    /// Add or replace a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Add or replace a file in place.
    pub fn insert(&mut self, path: impl Into<Utf8PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl FragmentStore for MemoryStore {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Utf8Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }
}
