use super::ProjectModder;
use crate::model::Project;
use crate::session::{CoordinatePattern, Session};
use anyhow::Result;

fn matches_any(patterns: &[CoordinatePattern], key: &crate::model::VersionlessProjectKey) -> bool {
    patterns.iter().any(|p| p.matches(key))
}

/// Drops configured plugins from build plugins and plugin management
pub struct RemovePluginsModder;

impl ProjectModder for RemovePluginsModder {
    fn id(&self) -> &'static str {
        "remove-plugins"
    }

    fn description(&self) -> &'static str {
        "Removes configured build plugins"
    }

    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool> {
        let patterns = &session.options.removed_plugins;
        if patterns.is_empty() {
            return Ok(false);
        }

        let mut removed = Vec::new();
        for plugins in [&mut project.model.plugins, &mut project.model.managed_plugins] {
            plugins.retain(|plugin| {
                let key = plugin.key();
                let drop = matches_any(patterns, &key);
                if drop {
                    removed.push(key);
                }
                !drop
            });
        }

        let pom = project.pom().to_path_buf();
        for key in &removed {
            session.record_change(&pom, self.id(), format!("removed plugin {}", key));
        }
        Ok(!removed.is_empty())
    }
}

/// Drops test-scoped dependencies on configured coordinates
pub struct RemoveTestsModder;

impl ProjectModder for RemoveTestsModder {
    fn id(&self) -> &'static str {
        "remove-tests"
    }

    fn description(&self) -> &'static str {
        "Removes configured test-scoped dependencies"
    }

    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool> {
        let patterns = &session.options.removed_tests;
        if patterns.is_empty() {
            return Ok(false);
        }

        let mut removed = Vec::new();
        for deps in [
            &mut project.model.dependencies,
            &mut project.model.managed_dependencies,
        ] {
            deps.retain(|dep| {
                let drop = dep.is_test() && matches_any(patterns, &dep.key());
                if drop {
                    removed.push(dep.key());
                }
                !drop
            });
        }

        let pom = project.pom().to_path_buf();
        for key in &removed {
            session.record_change(&pom, self.id(), format!("removed test dependency {}", key));
        }
        Ok(!removed.is_empty())
    }
}
