use super::{resolved, ProjectModder};
use crate::model::Project;
use crate::session::Session;
use anyhow::Result;

/// Removes plugin versions the toolchain manages and tracks the rest
pub struct ToolchainModder;

impl ProjectModder for ToolchainModder {
    fn id(&self) -> &'static str {
        "toolchain"
    }

    fn description(&self) -> &'static str {
        "Strips plugin versions managed by the toolchain"
    }

    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool> {
        if session.toolchain().is_none() {
            return Ok(false);
        }
        let pom = project.pom().to_path_buf();
        let mut stripped = Vec::new();
        let mut unmanaged = Vec::new();

        let model = &mut project.model;
        for plugin in model.plugins.iter_mut().chain(model.managed_plugins.iter_mut()) {
            let key = plugin.key();
            if session.toolchain_plugin_version(&key).is_some() {
                if plugin.version.take().is_some() {
                    stripped.push(key);
                }
            } else {
                unmanaged.push((key, plugin.version.clone()));
            }
        }

        for (key, version) in unmanaged {
            let version = version.map(|v| resolved(project, &v));
            session.add_unmanaged_plugin(&pom, key, version);
        }
        for key in &stripped {
            session.record_change(&pom, self.id(), format!("plugin {} now managed by toolchain", key));
        }
        Ok(!stripped.is_empty())
    }
}
