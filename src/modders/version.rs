use super::{resolved, ProjectModder};
use crate::model::Project;
use crate::session::Session;
use anyhow::Result;

/// Applies the run's version suffix/modifier to the project and to references
/// to other batch members
pub struct VersionModder;

impl ProjectModder for VersionModder {
    fn id(&self) -> &'static str {
        "version"
    }

    fn description(&self) -> &'static str {
        "Applies the version suffix and modifier to batch versions"
    }

    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool> {
        if !session.options.modifies_versions() {
            return Ok(false);
        }
        let pom = project.pom().to_path_buf();
        let mut changes = Vec::new();

        if let Some(version) = project.model.version.clone() {
            if !version.contains("${") {
                let modified = session.options.modify_version(&version);
                if modified != version {
                    changes.push(format!("version {} -> {}", version, modified));
                    project.model.version = Some(modified);
                }
            }
        }

        if let Some(parent) = project.model.parent.as_mut() {
            if session.is_batch_member(&parent.key()) && !session.has_missing_parent(&pom) {
                let modified = session.options.modify_version(&parent.version);
                if modified != parent.version {
                    changes.push(format!("parent version {} -> {}", parent.version, modified));
                    parent.version = modified;
                }
            }
        }

        let mut references = Vec::new();
        for (managed, deps) in [
            (false, &project.model.dependencies),
            (true, &project.model.managed_dependencies),
        ] {
            for (idx, dep) in deps.iter().enumerate() {
                let Some(raw) = dep.version.as_deref() else {
                    continue;
                };
                if raw.contains("${") {
                    continue;
                }
                let version = resolved(project, raw);
                if !session.is_batch_member(&dep.key().with_version(&version)) {
                    continue;
                }
                let modified = session.options.modify_version(&version);
                if modified != raw {
                    references.push((managed, idx, modified));
                }
            }
        }
        for (managed, idx, modified) in references {
            let deps = if managed {
                &mut project.model.managed_dependencies
            } else {
                &mut project.model.dependencies
            };
            let dep = &mut deps[idx];
            changes.push(format!(
                "dependency {} {} -> {}",
                dep.key(),
                dep.version.as_deref().unwrap_or_default(),
                modified
            ));
            dep.version = Some(modified);
        }

        for change in &changes {
            session.record_change(&pom, self.id(), change.clone());
        }
        Ok(!changes.is_empty())
    }
}
