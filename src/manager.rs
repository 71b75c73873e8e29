//! Drives one realignment session end to end
//!
//! Catalogs are registered first (BOMs in the order given, then the
//! toolchain), then the target tree is loaded as one batch, ancestry is
//! completed, and every project goes through modify, verify and write.
//! Reports and the optional capture descriptor close the run.

use crate::config::{ConfigError, RealignConfig};
use crate::error::{ErrorScope, MultiError, RealignError};
use crate::modders::ModderPipeline;
use crate::model::{load_project, Project};
use crate::report::{CaptureBuilder, ReportWriter};
use crate::resolve::{
    AncestryReconstructor, BomFetcher, EmptyRepository, LocalRepository, RepositoryResolver,
    WorkspaceResolver,
};
use crate::rewrite::PomWriter;
use crate::session::{Activity, Session};
use crate::verify::Verifier;
use anyhow::Result;
use chrono::{DateTime, Utc};
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Directories never scanned for descriptors
const EXCLUDED_DIRS: &[&str] = &["target", "node_modules"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogRole {
    Bom,
    Toolchain,
}

/// Outcome of a run, serializable for `--format json|yaml`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub target: PathBuf,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub boms: Vec<String>,
    pub toolchain: Option<String>,
    pub scanned: usize,
    pub loaded: usize,
    pub changed: usize,
    pub written: Vec<PathBuf>,
    pub changes: BTreeMap<PathBuf, Vec<Activity>>,
    pub missing_versions: usize,
    pub unmanaged_plugins: usize,
    pub missing_parents: Vec<String>,
    pub errors: Vec<ErrorSummary>,
    pub reports: Vec<PathBuf>,
    pub capture: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    pub scope: String,
    pub messages: Vec<String>,
}

impl RunSummary {
    /// 0 when the run was clean and nothing had to be captured, 2 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.errors.is_empty() && self.capture.is_none() {
            0
        } else {
            2
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.iter().map(|e| e.messages.len()).sum()
    }
}

pub struct VersionManager {
    config: RealignConfig,
    repository: Box<dyn RepositoryResolver>,
    modders: ModderPipeline,
    verifier: Verifier,
    reports: ReportWriter,
    capture: CaptureBuilder,
}

impl VersionManager {
    /// Validates the configuration and wires the default registries
    pub fn new(config: RealignConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let modders = config.modder_pipeline()?;
        let repository = default_repository(&config);
        Ok(Self {
            config,
            repository,
            modders,
            verifier: Verifier::default(),
            reports: ReportWriter::default(),
            capture: CaptureBuilder::default(),
        })
    }

    pub fn with_repository(mut self, repository: Box<dyn RepositoryResolver>) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_reports(mut self, reports: ReportWriter) -> Self {
        self.reports = reports;
        self
    }

    pub fn config(&self) -> &RealignConfig {
        &self.config
    }

    pub fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let options = self.config.session_options()?;
        let mut session = Session::new(options, &self.config.workspace);

        self.register_overrides(&mut session)?;
        let catalog_files = self.register_catalogs(&mut session);

        let files = self.discover(&catalog_files);
        let scanned = files.len();
        info!(target = %self.config.target.display(), files = scanned, "Discovered descriptors");

        self.load_batch(&mut session, &files);
        let loaded = session.projects().len();

        let connected =
            AncestryReconstructor::new(self.repository.as_ref()).reconstruct_batch(&mut session);
        debug!(connected, "Ancestry reconstructed");
        self.precompute_effective(&session);

        let (changed, written) = self.process(&mut session);

        let capture = self.capture.build(&session);
        let capture_path = match &self.config.capture {
            Some(path) if !capture.is_empty() => match capture.write_pom(path) {
                Ok(path) => Some(path),
                Err(e) => {
                    session.add_error(ErrorScope::Global, e);
                    None
                }
            },
            _ => None,
        };

        let (reports, failures) =
            self.reports
                .write_all(&session, &capture, &self.config.reports_path());
        for failure in failures {
            session.add_error(ErrorScope::Global, failure);
        }

        let summary = RunSummary {
            target: self.config.target.clone(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            boms: session.bom_keys().iter().map(ToString::to_string).collect(),
            toolchain: session.toolchain_key().map(|k| k.to_string()),
            scanned,
            loaded,
            changed,
            written,
            changes: session
                .activity()
                .iter()
                .map(|(pom, entries)| (pom.clone(), entries.clone()))
                .collect(),
            missing_versions: session.missing_versions().values().map(|s| s.len()).sum(),
            unmanaged_plugins: session.unmanaged_plugins().values().map(|s| s.len()).sum(),
            missing_parents: session
                .missing_parents()
                .keys()
                .map(ToString::to_string)
                .collect(),
            errors: session
                .errors()
                .iter()
                .map(|(scope, errors)| ErrorSummary {
                    scope: scope.to_string(),
                    messages: errors.iter().map(|e| format!("{:#}", e)).collect(),
                })
                .collect(),
            reports,
            capture: capture_path,
        };

        if session.has_errors() {
            let causes = session
                .take_errors()
                .into_iter()
                .map(|(scope, e)| e.context(scope.to_string()))
                .collect();
            warn!("{}", MultiError::new("Realignment finished with errors", causes).render());
        }

        info!(
            loaded = summary.loaded,
            changed = summary.changed,
            written = summary.written.len(),
            errors = summary.error_count(),
            duration_ms = summary.duration_ms,
            "Realignment complete"
        );
        Ok(summary)
    }

    /// Command-line relocations and properties, registered ahead of any BOM
    fn register_overrides(&self, session: &mut Session) -> Result<(), ConfigError> {
        for (from, to) in self.config.parsed_relocations()? {
            session.add_relocation(from, to);
        }
        for (name, value) in self.config.parsed_properties()? {
            session.add_mapping(name, value);
        }
        Ok(())
    }

    /// Loads every BOM then the toolchain; returns the local files they came from
    fn register_catalogs(&self, session: &mut Session) -> Vec<PathBuf> {
        let fetcher = BomFetcher::new(session.downloads_dir())
            .with_attempts(self.config.fetch_attempts);
        let mut files = Vec::new();

        let locators = self
            .config
            .boms
            .iter()
            .filter(|b| !b.trim().is_empty())
            .map(|b| (b.as_str(), CatalogRole::Bom))
            .chain(
                self.config
                    .toolchain
                    .iter()
                    .map(|t| (t.as_str(), CatalogRole::Toolchain)),
            );

        for (locator, role) in locators {
            let Some((file, project)) = self.load_catalog(session, &fetcher, locator) else {
                continue;
            };
            match role {
                CatalogRole::Bom => session.add_bom(&file, project),
                CatalogRole::Toolchain => session.set_toolchain(&file, project),
            }
            files.push(file);
        }
        info!(
            boms = session.boms().len(),
            toolchain = session.toolchain().is_some(),
            entries = session.catalog().len(),
            "Catalog ready"
        );
        files
    }

    fn load_catalog(
        &self,
        session: &mut Session,
        fetcher: &BomFetcher,
        locator: &str,
    ) -> Option<(PathBuf, Project)> {
        let file = if BomFetcher::is_remote(locator) {
            match fetcher.fetch(locator) {
                Ok(path) => path,
                Err(e) => {
                    session.add_error(e.scope(), e);
                    return None;
                }
            }
        } else {
            PathBuf::from(locator)
        };

        let project = match load_project(&file) {
            Ok(project) => project,
            Err(e) => {
                session.add_error(e.scope(), e);
                return None;
            }
        };

        if let Some(parent) = project.model.parent.clone() {
            AncestryReconstructor::new(self.repository.as_ref())
                .reconstruct(session, vec![(file.clone(), parent)]);
        }
        project.effective(&WorkspaceResolver::new(session, self.repository.as_ref()));
        Some((file, project))
    }

    /// `pom.xml` and `*.pom` files under the target, in path order
    fn discover(&self, skip: &[PathBuf]) -> Vec<PathBuf> {
        let target = &self.config.target;
        if target.is_file() {
            return vec![target.clone()];
        }

        let mut override_builder = OverrideBuilder::new(target);
        for excluded in EXCLUDED_DIRS {
            override_builder.add(&format!("!{}/", excluded)).ok();
        }
        let overrides = match override_builder.build() {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!(error = %e, "Ignoring directory exclusions");
                ignore::overrides::Override::empty()
            }
        };

        let workspace = canonical(&self.config.workspace);
        let skip: Vec<PathBuf> = skip.iter().map(|p| canonical(p)).collect();

        let mut files = Vec::new();
        for result in WalkBuilder::new(target)
            .hidden(false)
            .git_ignore(true)
            .overrides(overrides)
            .filter_entry(move |entry| !canonical(entry.path()).starts_with(&workspace))
            .build()
        {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !is_descriptor(path) {
                continue;
            }
            if skip.contains(&canonical(path)) {
                debug!(path = %path.display(), "Skipping catalog descriptor");
                continue;
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        files
    }

    fn load_batch(&self, session: &mut Session, files: &[PathBuf]) {
        for file in files {
            match load_project(file) {
                Ok(project) => {
                    session.add_project(project);
                }
                Err(e) => session.add_error(e.scope(), e),
            }
        }
        info!(projects = session.projects().len(), "Loaded batch");
    }

    /// Computes every effective view while the whole batch is still resolvable
    fn precompute_effective(&self, session: &Session) {
        let resolver = WorkspaceResolver::new(session, self.repository.as_ref());
        for project in session.projects() {
            if session.has_missing_parent(project.pom()) {
                warn!(
                    pom = %project.pom().display(),
                    "Parent chain incomplete; inherited properties and versions stay unresolved"
                );
            }
            project.effective(&resolver);
        }
    }

    /// Modify, verify and write each project; returns the change count and written paths
    fn process(&self, session: &mut Session) -> (usize, Vec<PathBuf>) {
        let writer = PomWriter::new(self.config.base_dir()).relocating(self.config.relocate_files);
        let mut projects = session.take_projects();
        let mut changed = 0;
        let mut written = Vec::new();

        for project in projects.iter_mut() {
            if !self.modders.apply(project, session) {
                debug!(pom = %project.pom().display(), "No changes");
                continue;
            }
            changed += 1;

            let problems = self.verifier.verify(project, session);
            if problems > 0 {
                debug!(pom = %project.pom().display(), problems, "Verification problems");
            }

            match writer.write(project, session) {
                Ok(path) => written.push(path),
                Err(e) => record_write_failure(session, e),
            }
        }

        session.restore_projects(projects);
        (changed, written)
    }
}

fn record_write_failure(session: &mut Session, error: RealignError) {
    warn!(error = %error, "Descriptor not written");
    session.add_error(error.scope(), error);
}

fn default_repository(config: &RealignConfig) -> Box<dyn RepositoryResolver> {
    match &config.local_repository {
        Some(root) => Box::new(LocalRepository::new(root)),
        None => match LocalRepository::user_default().filter(|r| r.root().is_dir()) {
            Some(repo) => Box::new(repo),
            None => Box::new(EmptyRepository),
        },
    }
}

fn is_descriptor(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name == "pom.xml" || name.ends_with(".pom"))
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const BOM: &str = r#"<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.platform</groupId>
  <artifactId>platform-bom</artifactId>
  <version>7</version>
  <packaging>pom</packaging>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.slf4j</groupId>
        <artifactId>slf4j-api</artifactId>
        <version>2.0.9</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
</project>
"#;

    const APP: &str = r#"<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.app</groupId>
  <artifactId>app</artifactId>
  <version>1.0</version>
  <dependencies>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
      <version>1.7.36</version>
    </dependency>
  </dependencies>
</project>
"#;

    struct Fixture {
        _dir: TempDir,
        tree: PathBuf,
        config: RealignConfig,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("app")).unwrap();
        fs::write(tree.join("app/pom.xml"), APP).unwrap();
        let bom = dir.path().join("platform-bom.pom");
        fs::write(&bom, BOM).unwrap();

        let mut config = RealignConfig::new(&tree);
        config.boms.push(bom.display().to_string());
        config.workspace = dir.path().join("work");
        config.local_repository = Some(dir.path().join("repo"));
        Fixture {
            _dir: dir,
            tree,
            config,
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut fixture = fixture();
        fixture.config.boms.clear();
        assert!(matches!(
            VersionManager::new(fixture.config),
            Err(ConfigError::NoBoms)
        ));
    }

    #[test]
    fn test_run_realigns_and_reports() {
        let fixture = fixture();
        let summary = VersionManager::new(fixture.config.clone())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.loaded, 1);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.boms, vec!["org.platform:platform-bom:7".to_string()]);
        assert_eq!(summary.exit_code(), 0);

        let rewritten = fs::read_to_string(fixture.tree.join("app/pom.xml")).unwrap();
        assert!(!rewritten.contains("1.7.36"));
        assert!(rewritten.contains("<artifactId>platform-bom</artifactId>"));
        assert!(rewritten.contains("<scope>import</scope>"));

        let backup = fixture.config.workspace.join("backups/app/pom.xml");
        assert_eq!(fs::read_to_string(backup).unwrap(), APP);
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let fixture = fixture();
        VersionManager::new(fixture.config.clone())
            .unwrap()
            .run()
            .unwrap();
        let first = fs::read_to_string(fixture.tree.join("app/pom.xml")).unwrap();

        let summary = VersionManager::new(fixture.config.clone())
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(summary.changed, 0);
        assert!(summary.written.is_empty());
        assert_eq!(fs::read_to_string(fixture.tree.join("app/pom.xml")).unwrap(), first);
    }

    #[test]
    fn test_unreadable_bom_is_a_global_error() {
        let mut fixture = fixture();
        fixture.config.boms = vec!["/nonexistent/bom.pom".to_string()];
        let summary = VersionManager::new(fixture.config).unwrap().run().unwrap();
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.boms.is_empty());
        assert_eq!(summary.exit_code(), 2);
    }

    #[test]
    fn test_discover_skips_build_output_and_catalogs() {
        let fixture = fixture();
        fs::create_dir_all(fixture.tree.join("app/target")).unwrap();
        fs::write(fixture.tree.join("app/target/copied.pom"), APP).unwrap();
        fs::write(fixture.tree.join("notes.xml"), "<x/>").unwrap();
        let bom_in_tree = fixture.tree.join("bom.pom");
        fs::write(&bom_in_tree, BOM).unwrap();

        let manager = VersionManager::new(fixture.config.clone()).unwrap();
        let files = manager.discover(&[bom_in_tree]);
        assert_eq!(files, vec![fixture.tree.join("app/pom.xml")]);
    }

    #[test]
    fn test_capture_written_for_unmanaged_versions() {
        let mut fixture = fixture();
        fs::write(
            fixture.tree.join("app/pom.xml"),
            APP.replace("org.slf4j", "org.unknown"),
        )
        .unwrap();
        let capture = fixture.config.workspace.join("capture.pom");
        fixture.config.capture = Some(capture.clone());

        let summary = VersionManager::new(fixture.config.clone())
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(summary.missing_versions, 1);
        assert_eq!(summary.capture.as_deref(), Some(capture.as_path()));
        assert_eq!(summary.exit_code(), 2);
        assert!(fs::read_to_string(&capture)
            .unwrap()
            .contains("<artifactId>slf4j-api</artifactId>"));
        assert!(fixture
            .config
            .reports_path()
            .join("missing-versions.log")
            .is_file());
    }
}
