//! Coordinate resolution over the workspace and a repository fallback
//!
//! Batch members are rewritten in memory before anything is published, so
//! resolution has to see them (and the toolchain and BOMs) exactly like it
//! sees artifacts already sitting in a repository.

pub mod ancestry;
pub mod fetch;

use crate::model::{parse_model, Model, ProjectKey};
use crate::session::Session;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub use ancestry::AncestryReconstructor;
pub use fetch::BomFetcher;

/// Resolves a coordinate to a raw model
pub trait ModelResolver {
    fn resolve(&self, key: &ProjectKey) -> Option<Model>;
}

/// Source of descriptors the workspace does not know about
pub trait RepositoryResolver: Send + Sync {
    /// Location of the descriptor for `key`, if the repository has one
    fn locate(&self, key: &ProjectKey) -> Option<PathBuf>;

    fn resolve(&self, key: &ProjectKey) -> Option<Model> {
        let path = self.locate(key)?;
        let content = fs::read_to_string(&path).ok()?;
        match parse_model(&content) {
            Ok(model) => Some(model),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Unparsable repository descriptor");
                None
            }
        }
    }
}

/// Maven-layout directory: `<root>/<group/as/path>/<artifact>/<version>/<artifact>-<version>.pom`
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.m2/repository`, when a home directory exists
    pub fn user_default() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".m2").join("repository")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository-relative descriptor path for a coordinate
    pub fn relative_path(key: &ProjectKey) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in key.group_id.split('.') {
            path.push(segment);
        }
        path.push(&key.artifact_id);
        path.push(&key.version);
        path.push(format!("{}-{}.pom", key.artifact_id, key.version));
        path
    }
}

impl RepositoryResolver for LocalRepository {
    fn locate(&self, key: &ProjectKey) -> Option<PathBuf> {
        let path = self.root.join(Self::relative_path(key));
        path.is_file().then_some(path)
    }
}

/// Repository that knows nothing; used when no local repository is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyRepository;

impl RepositoryResolver for EmptyRepository {
    fn locate(&self, _key: &ProjectKey) -> Option<PathBuf> {
        None
    }
}

/// Workspace-first resolver: batch, ancestors, toolchain, BOMs, then repository
pub struct WorkspaceResolver<'a> {
    session: &'a Session,
    repository: &'a dyn RepositoryResolver,
}

impl<'a> WorkspaceResolver<'a> {
    pub fn new(session: &'a Session, repository: &'a dyn RepositoryResolver) -> Self {
        Self {
            session,
            repository,
        }
    }
}

impl ModelResolver for WorkspaceResolver<'_> {
    fn resolve(&self, key: &ProjectKey) -> Option<Model> {
        if let Some(idx) = self.session.find_batch_project(key) {
            if let Some(project) = self.session.projects().get(idx) {
                trace!(key = %key, "Resolved from batch");
                return Some(project.model.clone());
            }
        }
        if let Some(project) = self.session.ancestor(key) {
            trace!(key = %key, "Resolved from connected ancestors");
            return Some(project.model.clone());
        }
        if let Some(toolchain) = self.session.toolchain() {
            if toolchain.key() == *key {
                trace!(key = %key, "Resolved toolchain");
                return Some(toolchain.model.clone());
            }
        }
        if let Some(bom) = self.session.bom(key) {
            trace!(key = %key, "Resolved BOM");
            return Some(bom.model.clone());
        }
        self.repository.resolve(key)
    }
}
