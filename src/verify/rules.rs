use super::ProjectVerifier;
use crate::error::ErrorScope;
use crate::model::Project;
use crate::session::Session;

/// No non-import dependency may still pin a version outside the batch
pub struct BomRealignVerifier;

impl ProjectVerifier for BomRealignVerifier {
    fn id(&self) -> &'static str {
        "bom-realign"
    }

    fn verify(&self, project: &Project, session: &mut Session) {
        let pinned: Vec<String> = project
            .model
            .dependencies
            .iter()
            .chain(project.model.managed_dependencies.iter())
            .filter(|dep| !dep.is_import() && !session.is_batch_artifact(&dep.key()))
            .filter_map(|dep| {
                dep.version
                    .as_deref()
                    .map(|v| format!("{}:{}", dep.key(), v))
            })
            .collect();

        if !pinned.is_empty() {
            session.add_error(
                ErrorScope::file(project.pom()),
                anyhow::anyhow!(
                    "Dependencies still declare explicit versions: {}",
                    pinned.join(", ")
                ),
            );
        }
    }
}

/// Every build plugin must be managed by the toolchain
pub struct ToolchainVerifier;

impl ProjectVerifier for ToolchainVerifier {
    fn id(&self) -> &'static str {
        "toolchain"
    }

    fn verify(&self, project: &Project, session: &mut Session) {
        if session.toolchain().is_none() {
            return;
        }
        let unmanaged: Vec<String> = project
            .model
            .plugins
            .iter()
            .map(|plugin| plugin.key())
            .filter(|key| session.toolchain_plugin_version(key).is_none())
            .map(|key| key.to_string())
            .collect();

        if !unmanaged.is_empty() {
            session.add_error(
                ErrorScope::file(project.pom()),
                anyhow::anyhow!(
                    "Build plugins not managed by the toolchain: {}",
                    unmanaged.join(", ")
                ),
            );
        }
    }
}

/// The parent must be a catalog entry or another batch member
pub struct ParentVerifier;

impl ProjectVerifier for ParentVerifier {
    fn id(&self) -> &'static str {
        "parent"
    }

    fn verify(&self, project: &Project, session: &mut Session) {
        let Some(parent) = &project.model.parent else {
            return;
        };
        // Already reported while reconstructing ancestry
        if session.has_missing_parent(project.pom()) {
            return;
        }
        let key = parent.key();
        let catalogued = session.artifact_version(&key.versionless()) == Some(key.version.as_str());
        if catalogued || session.is_batch_member(&key) {
            return;
        }

        session.add_error(
            ErrorScope::file(project.pom()),
            anyhow::anyhow!("Missing parent version for {}", key),
        );
        session.add_missing_parent(project.pom(), key);
    }
}
