//! Synthesis of one managed entry per unresolved coordinate

use super::xml::XmlOut;
use crate::model::{MavenVersionComparator, ProjectKey, VersionComparator, VersionlessProjectKey};
use crate::session::{MissingEntry, Session};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CAPTURE_GROUP_ID: &str = "pomalign.capture";
pub const CAPTURE_ARTIFACT_ID: &str = "missing-info";
pub const CAPTURE_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedEntry {
    pub key: VersionlessProjectKey,
    pub version: Option<String>,
}

/// Deduplicated summary of everything the run could not resolve
#[derive(Debug, Clone, Default, Serialize)]
pub struct Capture {
    pub dependencies: Vec<CapturedEntry>,
    pub plugins: Vec<CapturedEntry>,
    pub parents: Vec<ProjectKey>,
}

impl Capture {
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.plugins.is_empty() && self.parents.is_empty()
    }

    /// Descriptor declaring every captured entry as managed, ready to be merged into a BOM
    pub fn to_pom(&self) -> Result<String> {
        let mut out = XmlOut::new()?;
        out.start_with("project", &[("xmlns", "http://maven.apache.org/POM/4.0.0")])?;
        out.text_element("modelVersion", "4.0.0")?;
        out.text_element("groupId", CAPTURE_GROUP_ID)?;
        out.text_element("artifactId", CAPTURE_ARTIFACT_ID)?;
        out.text_element("version", CAPTURE_VERSION)?;
        out.text_element("packaging", "pom")?;

        if !self.dependencies.is_empty() || !self.parents.is_empty() {
            out.start("dependencyManagement")?;
            out.start("dependencies")?;
            for entry in &self.dependencies {
                out.start("dependency")?;
                write_coordinates(&mut out, &entry.key, entry.version.as_deref())?;
                out.end("dependency")?;
            }
            if !self.parents.is_empty() {
                out.comment("missing parents")?;
            }
            for parent in &self.parents {
                out.start("dependency")?;
                write_coordinates(&mut out, &parent.versionless(), Some(&parent.version))?;
                out.text_element("type", "pom")?;
                out.end("dependency")?;
            }
            out.end("dependencies")?;
            out.end("dependencyManagement")?;
        }

        if !self.plugins.is_empty() {
            out.start("build")?;
            out.start("pluginManagement")?;
            out.start("plugins")?;
            for entry in &self.plugins {
                out.start("plugin")?;
                write_coordinates(&mut out, &entry.key, entry.version.as_deref())?;
                out.end("plugin")?;
            }
            out.end("plugins")?;
            out.end("pluginManagement")?;
            out.end("build")?;
        }

        out.end("project")?;
        out.finish()
    }

    pub fn write_pom(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_pom()?)
            .with_context(|| format!("Failed to write capture descriptor {}", path.display()))?;
        info!(
            path = %path.display(),
            dependencies = self.dependencies.len(),
            plugins = self.plugins.len(),
            parents = self.parents.len(),
            "Wrote capture descriptor"
        );
        Ok(path.to_path_buf())
    }
}

pub(crate) fn write_coordinates(
    out: &mut XmlOut,
    key: &VersionlessProjectKey,
    version: Option<&str>,
) -> Result<()> {
    out.text_element("groupId", &key.group_id)?;
    out.text_element("artifactId", &key.artifact_id)?;
    if let Some(version) = version {
        out.text_element("version", version)?;
    }
    Ok(())
}

/// Picks the best version per key using a pluggable ordering
pub struct CaptureBuilder {
    comparator: Box<dyn VersionComparator>,
}

impl Default for CaptureBuilder {
    fn default() -> Self {
        Self::new(Box::new(MavenVersionComparator))
    }
}

impl CaptureBuilder {
    pub fn new(comparator: Box<dyn VersionComparator>) -> Self {
        Self { comparator }
    }

    pub fn build(&self, session: &Session) -> Capture {
        Capture {
            dependencies: self.select(session.missing_versions()),
            plugins: self.select(session.unmanaged_plugins()),
            parents: session.missing_parents().keys().cloned().collect(),
        }
    }

    /// Highest parseable version; entries with no usable version sort lowest
    pub fn best_version<'v>(&self, versions: impl IntoIterator<Item = &'v str>) -> Option<String> {
        versions
            .into_iter()
            .filter(|v| self.comparator.is_parseable(v))
            .max_by(|a, b| self.comparator.compare(a, b))
            .map(str::to_string)
    }

    fn select(&self, per_file: &BTreeMap<PathBuf, BTreeSet<MissingEntry>>) -> Vec<CapturedEntry> {
        let mut versions: HashMap<&VersionlessProjectKey, Vec<&str>> = HashMap::new();
        for entry in per_file.values().flatten() {
            let seen = versions.entry(&entry.key).or_default();
            if let Some(version) = entry.version.as_deref() {
                seen.push(version);
            }
        }

        let mut entries: Vec<CapturedEntry> = versions
            .into_iter()
            .map(|(key, candidates)| CapturedEntry {
                key: key.clone(),
                version: self.best_version(candidates),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.key
                .group_id
                .cmp(&b.key.group_id)
                .then_with(|| a.key.artifact_id.cmp(&b.key.artifact_id))
        });
        entries
    }
}
