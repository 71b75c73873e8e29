//! First-registration-wins version catalog

use crate::model::VersionlessProjectKey;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub version: String,
    /// BOM (or toolchain) file that contributed the entry
    pub source: PathBuf,
}

#[derive(Debug, Default)]
pub struct Catalog {
    entries: HashMap<VersionlessProjectKey, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts unless the key is already managed; returns whether it was inserted
    pub fn insert(&mut self, key: VersionlessProjectKey, version: String, source: &Path) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            CatalogEntry {
                version,
                source: source.to_path_buf(),
            },
        );
        true
    }

    pub fn version(&self, key: &VersionlessProjectKey) -> Option<&str> {
        self.entries.get(key).map(|e| e.version.as_str())
    }

    pub fn entry(&self, key: &VersionlessProjectKey) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
