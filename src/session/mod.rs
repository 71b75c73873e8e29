//! Version-resolution session
//!
//! One [`Session`] is built per invocation and threaded explicitly through
//! every stage. It owns the precedence-ordered catalog, the relocation table,
//! property mappings, the toolchain, the loaded batch and its connected
//! ancestors, and every record-and-continue diagnostic collected on the way.

pub mod activity;
pub mod catalog;
pub mod mappings;
pub mod options;
pub mod relocation;

use crate::error::ErrorScope;
use crate::model::{Project, ProjectKey, VersionlessProjectKey};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use activity::{Activity, ActivityLog};
pub use catalog::{Catalog, CatalogEntry};
pub use mappings::PropertyMappings;
pub use options::{CoordinatePattern, SessionOptions, VersionModifier};
pub use relocation::{Relocation, Relocations};

/// Property on a BOM carrying relocation entries
pub const RELOCATIONS_PROPERTY: &str = "relocations";
/// Property on a BOM carrying property mappings
pub const MAPPINGS_PROPERTY: &str = "mappings";

/// An unresolved coordinate with the version it was seen at, if any
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MissingEntry {
    pub key: VersionlessProjectKey,
    pub version: Option<String>,
}

pub struct Session {
    pub options: SessionOptions,
    workspace: PathBuf,
    catalog: Catalog,
    relocations: Relocations,
    mappings: PropertyMappings,
    boms: Vec<Project>,
    toolchain: Option<Project>,
    toolchain_plugins: HashMap<VersionlessProjectKey, String>,
    projects: Vec<Project>,
    batch_index: HashMap<VersionlessProjectKey, Vec<(String, usize)>>,
    ancestors: HashMap<ProjectKey, Project>,
    missing_parents: BTreeMap<ProjectKey, BTreeSet<PathBuf>>,
    missing_parent_poms: HashSet<PathBuf>,
    missing_versions: BTreeMap<PathBuf, BTreeSet<MissingEntry>>,
    unmanaged_plugins: BTreeMap<PathBuf, BTreeSet<MissingEntry>>,
    errors: BTreeMap<ErrorScope, Vec<anyhow::Error>>,
    activity: ActivityLog,
}

impl Session {
    pub fn new(options: SessionOptions, workspace: impl Into<PathBuf>) -> Self {
        Self {
            options,
            workspace: workspace.into(),
            catalog: Catalog::new(),
            relocations: Relocations::new(),
            mappings: PropertyMappings::new(),
            boms: Vec::new(),
            toolchain: None,
            toolchain_plugins: HashMap::new(),
            projects: Vec::new(),
            batch_index: HashMap::new(),
            ancestors: HashMap::new(),
            missing_parents: BTreeMap::new(),
            missing_parent_poms: HashSet::new(),
            missing_versions: BTreeMap::new(),
            unmanaged_plugins: BTreeMap::new(),
            errors: BTreeMap::new(),
            activity: ActivityLog::new(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.workspace.join("backups")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.workspace.join("downloads")
    }

    // ---- catalog ---------------------------------------------------------

    /// Registers a BOM: its own coordinate, then its managed versions (first
    /// wins), its property mappings and its relocations
    pub fn add_bom(&mut self, file: &Path, project: Project) {
        let key = effective_key(&project);
        debug!(bom = %key, file = %file.display(), "Registering BOM");
        self.catalog
            .insert(key.versionless(), key.version.clone(), file);

        if let Some(text) = project.model.property(MAPPINGS_PROPERTY) {
            let (accepted, rejected) = PropertyMappings::parse(text);
            for (name, value) in accepted {
                self.mappings.insert(name, value);
            }
            for entry in rejected {
                self.add_error(
                    ErrorScope::file(file),
                    anyhow::anyhow!("Malformed property mapping '{}'", entry),
                );
            }
        }

        if let Some(text) = project.model.property(RELOCATIONS_PROPERTY) {
            let (parsed, errors) = Relocation::parse_list(text);
            for (from, mut to) in parsed {
                if let Some(version) = to.version.take() {
                    match self.mappings.expand(&version) {
                        Some(expanded) => to.version = Some(expanded),
                        None => self.add_error(
                            ErrorScope::file(file),
                            anyhow::anyhow!(
                                "Relocation {} -> {} has a cyclic version reference '{}'",
                                from,
                                to.target,
                                version
                            ),
                        ),
                    }
                }
                self.relocations.add(Some(file), from, to);
            }
            for e in errors {
                self.add_error(ErrorScope::file(file), e);
            }
        }

        let mut added = 0usize;
        for dep in &project.model.managed_dependencies {
            if dep.is_import() {
                debug!(bom = %key, import = %dep.key(), "Skipping nested BOM import");
                continue;
            }
            let Some(raw) = dep.version.as_deref() else {
                continue;
            };
            let version = interpolate(&project, raw);
            if version.contains("${") {
                self.add_error(
                    ErrorScope::file(file),
                    anyhow::anyhow!("Unresolved managed version '{}' for {}", version, dep.key()),
                );
                continue;
            }
            if self.catalog.insert(dep.key(), version, file) {
                added += 1;
            }
        }
        debug!(bom = %key, added, "BOM entries registered");

        self.boms.push(project);
    }

    /// Records the toolchain and its managed plugin versions
    pub fn set_toolchain(&mut self, file: &Path, project: Project) {
        let key = effective_key(&project);
        debug!(toolchain = %key, file = %file.display(), "Registering toolchain");
        self.catalog
            .insert(key.versionless(), key.version.clone(), file);

        let managed = project.model.managed_plugins.iter();
        let declared = project.model.plugins.iter();
        for plugin in managed.chain(declared) {
            if let Some(raw) = plugin.version.as_deref() {
                let version = interpolate(&project, raw);
                self.toolchain_plugins
                    .entry(plugin.key())
                    .or_insert(version);
            }
        }

        self.toolchain = Some(project);
    }

    pub fn artifact_version(&self, key: &VersionlessProjectKey) -> Option<&str> {
        self.catalog.version(key)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Final relocation target for a key, following chains; the key itself when none applies
    ///
    /// The last hop that carries a version decides it. A chain that loops
    /// back stops before revisiting a coordinate.
    pub fn relocation(&self, key: &VersionlessProjectKey) -> Relocation {
        let mut current = Relocation {
            target: key.clone(),
            version: None,
        };
        let mut seen = HashSet::from([key.clone()]);
        while let Some(next) = self.relocations.get(&current.target) {
            if !seen.insert(next.target.clone()) {
                warn!(from = %key, at = %next.target, "Relocation chain loops; stopping");
                break;
            }
            current = Relocation {
                target: next.target.clone(),
                version: next.version.clone().or(current.version),
            };
        }
        current
    }

    pub fn add_relocation(&mut self, from: VersionlessProjectKey, to: Relocation) {
        self.relocations.add(None, from, to);
    }

    pub fn relocations(&self) -> &Relocations {
        &self.relocations
    }

    pub fn mappings(&self) -> &PropertyMappings {
        &self.mappings
    }

    pub fn add_mapping(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.mappings.insert(name, value);
    }

    pub fn bom_keys(&self) -> Vec<ProjectKey> {
        self.boms.iter().map(effective_key).collect()
    }

    pub fn boms(&self) -> &[Project] {
        &self.boms
    }

    pub fn bom(&self, key: &ProjectKey) -> Option<&Project> {
        self.boms.iter().find(|b| effective_key(b) == *key)
    }

    pub fn toolchain(&self) -> Option<&Project> {
        self.toolchain.as_ref()
    }

    pub fn toolchain_key(&self) -> Option<ProjectKey> {
        self.toolchain.as_ref().map(effective_key)
    }

    pub fn toolchain_plugin_version(&self, key: &VersionlessProjectKey) -> Option<&str> {
        self.toolchain_plugins.get(key).map(String::as_str)
    }

    // ---- batch and ancestry ----------------------------------------------

    /// Adds a batch project; a second project with the same key is rejected
    pub fn add_project(&mut self, project: Project) -> bool {
        let key = project.key();
        if self.find_batch_project(&key).is_some() {
            self.add_error(
                ErrorScope::file(project.pom()),
                anyhow::anyhow!("Duplicate project {} already loaded in this batch", key),
            );
            return false;
        }
        let idx = self.projects.len();
        self.batch_index
            .entry(key.versionless())
            .or_default()
            .push((key.version.clone(), idx));
        self.projects.push(project);
        true
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Moves the batch out for mutation; the index keeps answering membership
    pub fn take_projects(&mut self) -> Vec<Project> {
        std::mem::take(&mut self.projects)
    }

    pub fn restore_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
    }

    /// True when `candidate` names `known`, allowing for this run's version policy
    pub fn version_matches(&self, candidate: &str, known: &str) -> bool {
        candidate == known
            || (self.options.modifies_versions()
                && (self.options.modify_version(known) == candidate
                    || self.options.modify_version(candidate) == known))
    }

    /// Batch index of the project a coordinate refers to
    pub fn find_batch_project(&self, key: &ProjectKey) -> Option<usize> {
        self.batch_index
            .get(&key.versionless())?
            .iter()
            .find(|(version, _)| self.version_matches(&key.version, version))
            .map(|(_, idx)| *idx)
    }

    pub fn is_batch_member(&self, key: &ProjectKey) -> bool {
        self.find_batch_project(key).is_some()
    }

    /// Whether any batch member has this groupId:artifactId
    pub fn is_batch_artifact(&self, key: &VersionlessProjectKey) -> bool {
        self.batch_index.contains_key(key)
    }

    /// Registers a reconstructed ancestor so lookups share one object per key
    pub fn connect(&mut self, project: Project) {
        let key = project.key();
        self.ancestors.entry(key).or_insert(project);
    }

    pub fn ancestor(&self, key: &ProjectKey) -> Option<&Project> {
        self.ancestors.get(key).or_else(|| {
            self.ancestors
                .iter()
                .find(|(known, _)| {
                    known.versionless() == key.versionless()
                        && self.version_matches(&key.version, &known.version)
                })
                .map(|(_, p)| p)
        })
    }

    pub fn ancestors(&self) -> impl Iterator<Item = &Project> {
        self.ancestors.values()
    }

    /// Batch member or connected ancestor
    pub fn is_known_project(&self, key: &ProjectKey) -> bool {
        self.is_batch_member(key) || self.ancestor(key).is_some()
    }

    // ---- diagnostics -----------------------------------------------------

    pub fn add_missing_version(&mut self, pom: &Path, key: VersionlessProjectKey, version: Option<String>) {
        debug!(pom = %pom.display(), dependency = %key, "Missing managed version");
        self.missing_versions
            .entry(pom.to_path_buf())
            .or_default()
            .insert(MissingEntry { key, version });
    }

    pub fn missing_versions(&self) -> &BTreeMap<PathBuf, BTreeSet<MissingEntry>> {
        &self.missing_versions
    }

    pub fn add_unmanaged_plugin(&mut self, pom: &Path, key: VersionlessProjectKey, version: Option<String>) {
        debug!(pom = %pom.display(), plugin = %key, "Plugin not managed by toolchain");
        self.unmanaged_plugins
            .entry(pom.to_path_buf())
            .or_default()
            .insert(MissingEntry { key, version });
    }

    pub fn unmanaged_plugins(&self) -> &BTreeMap<PathBuf, BTreeSet<MissingEntry>> {
        &self.unmanaged_plugins
    }

    pub fn add_missing_parent(&mut self, pom: &Path, parent: ProjectKey) {
        warn!(pom = %pom.display(), parent = %parent, "Missing parent");
        self.missing_parent_poms.insert(pom.to_path_buf());
        self.missing_parents
            .entry(parent)
            .or_default()
            .insert(pom.to_path_buf());
    }

    pub fn missing_parents(&self) -> &BTreeMap<ProjectKey, BTreeSet<PathBuf>> {
        &self.missing_parents
    }

    pub fn has_missing_parent(&self, pom: &Path) -> bool {
        self.missing_parent_poms.contains(pom)
    }

    /// Records a diagnostic; processing always continues
    pub fn add_error(&mut self, scope: ErrorScope, error: impl Into<anyhow::Error>) {
        let error = error.into();
        warn!(scope = %scope, error = %format!("{:#}", error), "Recorded error");
        self.errors.entry(scope).or_default().push(error);
    }

    pub fn errors(&self) -> &BTreeMap<ErrorScope, Vec<anyhow::Error>> {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Drains every diagnostic in scope order
    pub fn take_errors(&mut self) -> Vec<(ErrorScope, anyhow::Error)> {
        std::mem::take(&mut self.errors)
            .into_iter()
            .flat_map(|(scope, errors)| errors.into_iter().map(move |e| (scope.clone(), e)))
            .collect()
    }

    pub fn record_change(&mut self, pom: &Path, modder: &str, message: impl Into<String>) {
        let message = message.into();
        debug!(pom = %pom.display(), modder, change = %message, "Modified");
        self.activity.record(pom, modder, message);
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }
}

/// Effective coordinate when the view has been computed, raw key otherwise
fn effective_key(project: &Project) -> ProjectKey {
    project
        .cached_effective()
        .map(|e| e.key.clone())
        .unwrap_or_else(|| project.key())
}

fn interpolate(project: &Project, value: &str) -> String {
    project
        .cached_effective()
        .map(|e| e.interpolate(value))
        .unwrap_or_else(|| value.to_string())
}
