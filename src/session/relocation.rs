//! Coordinate relocations, scoped per originating BOM

use super::mappings::split_entries;
use crate::error::RealignError;
use crate::model::VersionlessProjectKey;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub target: VersionlessProjectKey,
    pub version: Option<String>,
}

impl Relocation {
    /// Parses `g:a=g:a[:v]`
    pub fn parse_entry(entry: &str) -> Result<(VersionlessProjectKey, Relocation), RealignError> {
        let invalid = || RealignError::InvalidCoordinate {
            value: entry.to_string(),
            expected: "groupId:artifactId=groupId:artifactId[:version]",
        };

        let (from, to) = entry.split_once('=').ok_or_else(invalid)?;
        let from: VersionlessProjectKey = from.parse().map_err(|_| invalid())?;

        let parts: Vec<&str> = to.trim().split(':').collect();
        let relocation = match parts.as_slice() {
            [g, a] if !g.is_empty() && !a.is_empty() => Relocation {
                target: VersionlessProjectKey::new(*g, *a),
                version: None,
            },
            [g, a, v] if !g.is_empty() && !a.is_empty() && !v.is_empty() => Relocation {
                target: VersionlessProjectKey::new(*g, *a),
                version: Some(v.to_string()),
            },
            _ => return Err(invalid()),
        };
        Ok((from, relocation))
    }

    /// Parses a delimited relocation list; malformed entries are returned separately
    pub fn parse_list(text: &str) -> (Vec<(VersionlessProjectKey, Relocation)>, Vec<RealignError>) {
        let mut parsed = Vec::new();
        let mut errors = Vec::new();
        for entry in split_entries(text) {
            match Self::parse_entry(&entry) {
                Ok(pair) => parsed.push(pair),
                Err(e) => errors.push(e),
            }
        }
        (parsed, errors)
    }
}

/// Relocation tables in registration order; `None` scope is the command line
#[derive(Debug, Default)]
pub struct Relocations {
    scopes: Vec<(Option<PathBuf>, HashMap<VersionlessProjectKey, Relocation>)>,
}

impl Relocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scope: Option<&Path>, from: VersionlessProjectKey, to: Relocation) {
        let scope = scope.map(Path::to_path_buf);
        let table = match self.scopes.iter().position(|(s, _)| *s == scope) {
            Some(idx) => &mut self.scopes[idx].1,
            None => {
                self.scopes.push((scope, HashMap::new()));
                let last = self.scopes.len() - 1;
                &mut self.scopes[last].1
            }
        };
        table.entry(from).or_insert(to);
    }

    /// First matching relocation across scopes
    pub fn get(&self, key: &VersionlessProjectKey) -> Option<&Relocation> {
        self.scopes.iter().find_map(|(_, table)| table.get(key))
    }

    pub fn len(&self) -> usize {
        self.scopes.iter().map(|(_, t)| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
