use super::{resolved, ProjectModder};
use crate::error::RealignError;
use crate::model::{Dependency, Project};
use crate::session::Session;
use anyhow::Result;

/// Defers dependency versions to the BOM catalog
pub struct BomRealignModder;

enum Decision {
    Strip,
    Missing(Option<String>),
    Keep,
}

fn decide(dep: &Dependency, project: &Project, session: &Session) -> Decision {
    let Some(raw) = dep.version.as_deref() else {
        return Decision::Keep;
    };
    if dep.is_import() || session.is_batch_artifact(&dep.key()) {
        return Decision::Keep;
    }
    if session.artifact_version(&dep.key()).is_some() {
        Decision::Strip
    } else {
        Decision::Missing(Some(resolved(project, raw)))
    }
}

impl ProjectModder for BomRealignModder {
    fn id(&self) -> &'static str {
        "bom-realign"
    }

    fn description(&self) -> &'static str {
        "Removes dependency versions managed by the BOMs"
    }

    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool> {
        let pom = project.pom().to_path_buf();

        let mut missing = Vec::new();
        let mut strip = Vec::new();
        for (managed, deps) in [
            (false, &project.model.dependencies),
            (true, &project.model.managed_dependencies),
        ] {
            for (idx, dep) in deps.iter().enumerate() {
                match decide(dep, project, session) {
                    Decision::Strip => strip.push((managed, idx)),
                    Decision::Missing(version) => missing.push((dep.key(), version)),
                    Decision::Keep => {}
                }
            }
        }

        let miss_count = missing.len();
        for (key, version) in missing {
            session.add_missing_version(&pom, key, version);
        }
        if session.options.strict && miss_count > 0 {
            return Err(RealignError::StrictMissingVersions {
                path: pom,
                count: miss_count,
            }
            .into());
        }

        let mut changes = Vec::new();
        for (managed, idx) in strip {
            let deps = if managed {
                &mut project.model.managed_dependencies
            } else {
                &mut project.model.dependencies
            };
            let dep = &mut deps[idx];
            if let Some(old) = dep.version.take() {
                changes.push(format!("{} version {} deferred to BOM", dep.key(), old));
            }
        }

        if session.options.normalize_bom_usage {
            project.model.managed_dependencies.retain(|dep| {
                if dep.is_bare() {
                    changes.push(format!("dropped redundant managed entry {}", dep.key()));
                    false
                } else {
                    true
                }
            });
        }

        for change in &changes {
            session.record_change(&pom, self.id(), change.clone());
        }
        Ok(!changes.is_empty())
    }
}
