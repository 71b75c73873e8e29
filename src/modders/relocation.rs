use super::ProjectModder;
use crate::model::{Dependency, Project, DEFAULT_PLUGIN_GROUP};
use crate::session::Session;
use anyhow::Result;

/// Rewrites references to relocated coordinates
pub struct RelocationModder;

impl ProjectModder for RelocationModder {
    fn id(&self) -> &'static str {
        "relocations"
    }

    fn description(&self) -> &'static str {
        "Rewrites relocated dependency, plugin and parent coordinates"
    }

    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool> {
        if session.relocations().is_empty() {
            return Ok(false);
        }
        let pom = project.pom().to_path_buf();
        let mut changes = Vec::new();

        let model = &mut project.model;
        for dep in model
            .dependencies
            .iter_mut()
            .chain(model.managed_dependencies.iter_mut())
        {
            if let Some(change) = relocate_dependency(dep, session) {
                changes.push(change);
            }
        }

        for plugin in model
            .plugins
            .iter_mut()
            .chain(model.managed_plugins.iter_mut())
        {
            let key = plugin.key();
            let relocation = session.relocation(&key);
            if relocation.target == key {
                continue;
            }
            plugin.group_id = if plugin.group_id.is_none()
                && relocation.target.group_id == DEFAULT_PLUGIN_GROUP
            {
                None
            } else {
                Some(relocation.target.group_id.clone())
            };
            plugin.artifact_id = relocation.target.artifact_id.clone();
            if let (Some(version), Some(_)) = (&relocation.version, &plugin.version) {
                plugin.version = Some(version.clone());
            }
            changes.push(format!("plugin {} -> {}", key, relocation.target));
        }

        if let Some(parent) = model.parent.as_mut() {
            let key = parent.key().versionless();
            let relocation = session.relocation(&key);
            if relocation.target != key {
                parent.group_id = relocation.target.group_id.clone();
                parent.artifact_id = relocation.target.artifact_id.clone();
                if let Some(version) = relocation.version {
                    parent.version = version;
                }
                changes.push(format!("parent {} -> {}", key, parent.key()));
            }
        }

        for change in &changes {
            session.record_change(&pom, self.id(), change.clone());
        }
        Ok(!changes.is_empty())
    }
}

fn relocate_dependency(dep: &mut Dependency, session: &Session) -> Option<String> {
    let key = dep.key();
    let relocation = session.relocation(&key);
    if relocation.target == key {
        return None;
    }
    dep.group_id = relocation.target.group_id.clone();
    dep.artifact_id = relocation.target.artifact_id.clone();
    if let (Some(version), Some(_)) = (&relocation.version, &dep.version) {
        dep.version = Some(version.clone());
    }
    Some(format!("dependency {} -> {}", key, relocation.target))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::model::VersionlessProjectKey;
    use crate::session::{Relocation, SessionOptions};

    fn relocate(session: &mut Session, from: &str, to: &str) {
        let (from, to) = Relocation::parse_entry(&format!("{from}={to}")).unwrap();
        session.add_relocation(from, to);
    }

    #[test]
    fn test_relocates_dependencies_and_parent() {
        let mut session = session_with(SessionOptions::default());
        relocate(&mut session, "old:lib", "new:lib:2.0");
        relocate(&mut session, "old:parent", "new:parent:5");
        relocate(&mut session, "old:unversioned", "new:unversioned:3");

        let mut project = project(
            r#"<project>
              <parent><groupId>old</groupId><artifactId>parent</artifactId><version>1</version></parent>
              <artifactId>app</artifactId>
              <dependencies>
                <dependency><groupId>old</groupId><artifactId>lib</artifactId><version>1.0</version></dependency>
                <dependency><groupId>old</groupId><artifactId>unversioned</artifactId></dependency>
                <dependency><groupId>other</groupId><artifactId>lib</artifactId><version>1.0</version></dependency>
              </dependencies>
            </project>"#,
        );

        assert!(RelocationModder.apply(&mut project, &mut session).unwrap());
        let deps = &project.model.dependencies;
        assert_eq!(deps[0].key(), VersionlessProjectKey::new("new", "lib"));
        assert_eq!(deps[0].version.as_deref(), Some("2.0"));
        assert_eq!(deps[1].key(), VersionlessProjectKey::new("new", "unversioned"));
        assert_eq!(deps[1].version, None);
        assert_eq!(deps[2].key(), VersionlessProjectKey::new("other", "lib"));

        let parent = project.model.parent.as_ref().unwrap();
        assert_eq!(parent.key().to_string(), "new:parent:5");
        assert_eq!(session.activity().for_file(project.pom()).len(), 3);

        assert!(!RelocationModder.apply(&mut project, &mut session).unwrap());
    }

    #[test]
    fn test_chained_relocations_settle_in_one_run() {
        let mut session = session_with(SessionOptions::default());
        relocate(&mut session, "old:lib", "interim:lib:1.5");
        relocate(&mut session, "interim:lib", "new:lib");

        let mut project = project(
            r#"<project><groupId>g</groupId><artifactId>app</artifactId><version>1</version><dependencies>
              <dependency><groupId>old</groupId><artifactId>lib</artifactId><version>1.0</version></dependency>
            </dependencies></project>"#,
        );

        assert!(RelocationModder.apply(&mut project, &mut session).unwrap());
        let dep = &project.model.dependencies[0];
        assert_eq!(dep.key(), VersionlessProjectKey::new("new", "lib"));
        assert_eq!(dep.version.as_deref(), Some("1.5"));
        assert!(!RelocationModder.apply(&mut project, &mut session).unwrap());
    }

    #[test]
    fn test_relocates_plugins() {
        let mut session = session_with(SessionOptions::default());
        relocate(&mut session, "org.apache.maven.plugins:maven-old-plugin", "org.apache.maven.plugins:maven-new-plugin");

        let mut project = project(
            r#"<project><groupId>g</groupId><artifactId>app</artifactId><version>1</version>
              <build><plugins><plugin><artifactId>maven-old-plugin</artifactId></plugin></plugins></build>
            </project>"#,
        );

        assert!(RelocationModder.apply(&mut project, &mut session).unwrap());
        let plugin = &project.model.plugins[0];
        assert_eq!(plugin.group_id, None);
        assert_eq!(plugin.artifact_id, "maven-new-plugin");
    }
}
