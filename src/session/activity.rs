//! Per-file record of mutations performed by modders

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub modder: String,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ActivityLog {
    entries: BTreeMap<PathBuf, Vec<Activity>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pom: &Path, modder: &str, message: impl Into<String>) {
        self.entries
            .entry(pom.to_path_buf())
            .or_default()
            .push(Activity {
                modder: modder.to_string(),
                message: message.into(),
            });
    }

    pub fn for_file(&self, pom: &Path) -> &[Activity] {
        self.entries.get(pom).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Vec<Activity>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
