//! Reconstruction of parent chains missing from the input batch
//!
//! Runs as an explicit worklist keyed by parent coordinate. A visited map
//! guards against cycles and remembers each coordinate's outcome so a shared
//! missing parent is attributed to every descriptor that needs it.

use super::RepositoryResolver;
use crate::error::{ErrorScope, RealignError};
use crate::model::{load_project, Parent, Project, ProjectKey};
use crate::session::Session;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_RELATIVE_PATH: &str = "../pom.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Known,
    Connected,
    Missing,
    Failed,
}

struct Request {
    /// Descriptor at the bottom of the chain; diagnostics are filed against it
    root: PathBuf,
    /// Directory `relativePath` is resolved from
    origin_dir: PathBuf,
    parent: Parent,
}

pub struct AncestryReconstructor<'a> {
    repository: &'a dyn RepositoryResolver,
}

impl<'a> AncestryReconstructor<'a> {
    pub fn new(repository: &'a dyn RepositoryResolver) -> Self {
        Self { repository }
    }

    /// Completes the ancestry of every batch project; returns how many ancestors were connected
    pub fn reconstruct_batch(&self, session: &mut Session) -> usize {
        let roots: Vec<(PathBuf, Parent)> = session
            .projects()
            .iter()
            .filter_map(|p| {
                p.model
                    .parent
                    .clone()
                    .map(|parent| (p.pom().to_path_buf(), parent))
            })
            .collect();
        self.reconstruct(session, roots)
    }

    /// Completes the ancestry for arbitrary `(descriptor, parent)` roots
    pub fn reconstruct(&self, session: &mut Session, roots: Vec<(PathBuf, Parent)>) -> usize {
        let mut queue: VecDeque<Request> = roots
            .into_iter()
            .map(|(pom, parent)| Request {
                origin_dir: pom.parent().map(Path::to_path_buf).unwrap_or_default(),
                root: pom,
                parent,
            })
            .collect();
        let mut outcomes: HashMap<ProjectKey, Outcome> = HashMap::new();
        let mut connected = 0;

        while let Some(request) = queue.pop_front() {
            let key = request.parent.key();

            if let Some(outcome) = outcomes.get(&key) {
                if *outcome == Outcome::Missing {
                    report_missing(session, &request.root, key);
                }
                continue;
            }

            if is_known(session, &key) {
                outcomes.insert(key, Outcome::Known);
                continue;
            }

            let outcome = match self.load_parent(session, &request) {
                Ok(Some(project)) => {
                    debug!(
                        parent = %key,
                        pom = %project.pom().display(),
                        "Connected ancestor"
                    );
                    if let Some(grandparent) = project.model.parent.clone() {
                        queue.push_back(Request {
                            root: request.root.clone(),
                            origin_dir: project
                                .pom()
                                .parent()
                                .map(Path::to_path_buf)
                                .unwrap_or_default(),
                            parent: grandparent,
                        });
                    }
                    session.connect(project);
                    connected += 1;
                    Outcome::Connected
                }
                Ok(None) => {
                    report_missing(session, &request.root, key.clone());
                    Outcome::Missing
                }
                Err(e) => {
                    session.add_error(
                        ErrorScope::file(&request.root),
                        RealignError::AncestryLoad {
                            path: request.root.clone(),
                            parent: key.to_string(),
                            message: e.to_string(),
                        },
                    );
                    Outcome::Failed
                }
            };
            outcomes.insert(key, outcome);
        }

        if connected > 0 {
            info!(connected, "Reconstructed ancestry");
        }
        connected
    }

    fn load_parent(
        &self,
        session: &Session,
        request: &Request,
    ) -> Result<Option<Project>, RealignError> {
        let key = request.parent.key();
        let relative = request
            .parent
            .relative_path
            .as_deref()
            .unwrap_or(DEFAULT_RELATIVE_PATH);

        if !relative.is_empty() {
            let mut candidate = request.origin_dir.join(relative);
            if candidate.is_dir() {
                candidate.push("pom.xml");
            }
            if candidate.is_file() {
                let project = load_project(&candidate)?;
                let found = project.key();
                if found.versionless() == key.versionless()
                    && session.version_matches(&key.version, &found.version)
                {
                    return Ok(Some(project));
                }
                debug!(
                    expected = %key,
                    found = %found,
                    path = %candidate.display(),
                    "relativePath points at a different project"
                );
            }
        }

        match self.repository.locate(&key) {
            Some(path) => load_project(&path).map(Some),
            None => Ok(None),
        }
    }
}

/// Files one missing-parent record and one error per descriptor
fn report_missing(session: &mut Session, pom: &Path, parent: ProjectKey) {
    if session.has_missing_parent(pom) {
        return;
    }
    session.add_error(
        ErrorScope::file(pom),
        anyhow::anyhow!("Missing parent version for {}", parent),
    );
    session.add_missing_parent(pom, parent);
}

fn is_known(session: &Session, key: &ProjectKey) -> bool {
    session.is_known_project(key)
        || session.toolchain_key().as_ref() == Some(key)
        || session.bom(key).is_some()
}
