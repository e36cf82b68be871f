//! Board configuration fingerprints.
//!
//! [`ConfigHasher`] computes a stable SHA-256 digest of an assembled
//! [`BoardConfig`]. Downstream tools compare fingerprints to decide whether a
//! board needs reconfiguring.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//! use boardsmith::composer::{Composer, ConfigContext};
//! use boardsmith::fragment::MemoryStore;
//! use boardsmith::hasher::ConfigHasher;
//!
//! let composer = Composer::new(ConfigContext::new(".", MemoryStore::default()));
//! let board = composer
//!     .assemble_board_config(32, Vec::new(), Vec::new(), None, BTreeMap::new())
//!     .expect("assemble");
//! assert_eq!(ConfigHasher::hash(&board).len(), 64);
//! ```

use sha2::{Digest, Sha256};

use crate::composer::{BoardConfig, FeatureFlag};

/// Computes stable digests for [`BoardConfig`] values.
pub struct ConfigHasher;

impl ConfigHasher {
    /// Calculate the hash of a [`BoardConfig`].
    #[must_use]
    pub fn hash(board: &BoardConfig) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"board");
        Self::update_with_len(&mut hasher, board.board_id().to_string().as_bytes());
        let fragments = board.fragment_paths().iter().map(|p| p.as_str());
        Self::hash_list(&mut hasher, b"frag", fragments);
        let flags = board.extra_flags().iter().map(String::as_str);
        Self::hash_list(&mut hasher, b"flag", flags);
        Self::hash_optional_string(&mut hasher, board.manifest_path().map(|p| p.as_str()));
        Self::hash_features(&mut hasher, board);
        hasher.update(b"set");
        for (key, setting) in board.settings().iter() {
            Self::update_with_len(&mut hasher, key.as_bytes());
            Self::update_with_len(&mut hasher, setting.value.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    fn hash_features(hasher: &mut Sha256, board: &BoardConfig) {
        hasher.update(b"feat");
        for (name, flag) in board.feature_flags() {
            Self::update_with_len(hasher, name.as_bytes());
            match flag {
                FeatureFlag::Switch(on) => hasher.update(if *on { b"s1" } else { b"s0" }),
                FeatureFlag::Set(members) => {
                    Self::hash_list(hasher, b"set", members.iter().map(String::as_str));
                }
            }
        }
    }

    fn hash_list<'a>(
        hasher: &mut Sha256,
        tag: &[u8],
        items: impl ExactSizeIterator<Item = &'a str>,
    ) {
        hasher.update(tag);
        Self::update_with_len(hasher, items.len().to_string().as_bytes());
        for item in items {
            Self::update_with_len(hasher, item.as_bytes());
        }
    }

    fn hash_optional_string(hasher: &mut Sha256, value: Option<&str>) {
        match value {
            Some(v) => {
                hasher.update(b"1");
                Self::update_with_len(hasher, v.as_bytes());
            }
            None => hasher.update(b"0"),
        }
    }

    fn update_with_len(hasher: &mut Sha256, bytes: &[u8]) {
        let len = bytes.len();
        hasher.update(format!("{len}:").as_bytes());
        hasher.update(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{Composer, ConfigContext};
    use crate::fragment::MemoryStore;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use std::collections::{BTreeMap, BTreeSet};

    fn composer() -> Composer {
        let store = MemoryStore::default()
            .with_file("a.conf", "X=0\n")
            .with_file("b.conf", "X=1\n");
        Composer::new(ConfigContext::new(".", store))
    }

    fn assemble(
        composer: &Composer,
        fragments: &[&str],
        features: BTreeMap<String, FeatureFlag>,
    ) -> BoardConfig {
        composer
            .assemble_board_config(
                7,
                fragments.iter().map(|f| Utf8PathBuf::from(*f)).collect(),
                vec!["-Os".into()],
                None,
                features,
            )
            .expect("assemble")
    }

    #[rstest]
    fn identical_inputs_hash_identically() {
        let composer = composer();
        let first = assemble(&composer, &["a.conf", "b.conf"], BTreeMap::new());
        let second = assemble(&composer, &["a.conf", "b.conf"], BTreeMap::new());
        assert_eq!(ConfigHasher::hash(&first), ConfigHasher::hash(&second));
    }

    #[rstest]
    fn fragment_order_changes_hash() {
        let composer = composer();
        let forward = assemble(&composer, &["a.conf", "b.conf"], BTreeMap::new());
        let reverse = assemble(&composer, &["b.conf", "a.conf"], BTreeMap::new());
        assert_ne!(ConfigHasher::hash(&forward), ConfigHasher::hash(&reverse));
    }

    #[rstest]
    fn feature_shape_changes_hash() {
        let composer = composer();
        let switch = BTreeMap::from([("ble".to_owned(), FeatureFlag::Switch(true))]);
        let set = BTreeMap::from([(
            "ble".to_owned(),
            FeatureFlag::Set(BTreeSet::from(["central".to_owned()])),
        )]);
        let a = assemble(&composer, &["a.conf"], switch);
        let b = assemble(&composer, &["a.conf"], set);
        assert_ne!(ConfigHasher::hash(&a), ConfigHasher::hash(&b));
    }
}
