use super::ProjectModder;
use crate::model::{Dependency, Project};
use crate::session::Session;
use anyhow::Result;

/// Adds import-scoped references to every registered BOM (and the toolchain)
/// to projects at the top of a batch hierarchy
pub struct BomInjectModder;

impl ProjectModder for BomInjectModder {
    fn id(&self) -> &'static str {
        "bom-inject"
    }

    fn description(&self) -> &'static str {
        "Imports the BOMs into dependency management"
    }

    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool> {
        if let Some(parent) = &project.model.parent {
            if session.is_batch_member(&parent.key()) {
                return Ok(false);
            }
        }

        let mut wanted = session.bom_keys();
        wanted.extend(session.toolchain_key());
        if wanted.is_empty() {
            return Ok(false);
        }

        let mut changes = Vec::new();
        let mut inserted = Vec::new();
        let managed = &mut project.model.managed_dependencies;
        for key in &wanted {
            let existing = managed
                .iter_mut()
                .find(|dep| dep.is_import() && dep.key() == key.versionless());
            match existing {
                Some(dep) => {
                    if dep.version.as_deref() != Some(key.version.as_str()) {
                        changes.push(format!(
                            "import {} version {} -> {}",
                            dep.key(),
                            dep.version.as_deref().unwrap_or("none"),
                            key.version
                        ));
                        dep.version = Some(key.version.clone());
                    }
                }
                None => {
                    changes.push(format!("imported {}", key));
                    inserted.push(Dependency::bom_import(key));
                }
            }
        }
        for (idx, dep) in inserted.into_iter().enumerate() {
            managed.insert(idx, dep);
        }

        let pom = project.pom().to_path_buf();
        for change in &changes {
            session.record_change(&pom, self.id(), change.clone());
        }
        Ok(!changes.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::model::parse::project_from_str;
    use crate::session::SessionOptions;
    use std::path::Path;

    fn two_bom_session() -> Session {
        let mut session = session_with(SessionOptions::default());
        for name in ["first", "second"] {
            let xml = format!(
                "<project><groupId>org.bom</groupId><artifactId>{name}</artifactId><version>2</version></project>"
            );
            let path = format!("/boms/{name}.pom");
            session.add_bom(
                Path::new(&path),
                project_from_str(Path::new(&path), xml).unwrap(),
            );
        }
        session
    }

    #[test]
    fn test_injects_in_registration_order_before_existing_entries() {
        let mut session = two_bom_session();
        let mut project = project(
            r#"<project><groupId>g</groupId><artifactId>app</artifactId><version>1</version>
              <dependencyManagement><dependencies>
                <dependency><groupId>x</groupId><artifactId>y</artifactId><version>1</version></dependency>
              </dependencies></dependencyManagement></project>"#,
        );

        assert!(BomInjectModder.apply(&mut project, &mut session).unwrap());
        let managed: Vec<String> = project
            .model
            .managed_dependencies
            .iter()
            .map(|d| d.key().to_string())
            .collect();
        assert_eq!(managed, vec!["org.bom:first", "org.bom:second", "x:y"]);
        assert!(project.model.managed_dependencies[0].is_import());

        assert!(!BomInjectModder.apply(&mut project, &mut session).unwrap());
    }

    #[test]
    fn test_updates_existing_import_instead_of_duplicating() {
        let mut session = two_bom_session();
        let mut project = project(
            r#"<project><groupId>g</groupId><artifactId>app</artifactId><version>1</version>
              <dependencyManagement><dependencies>
                <dependency><groupId>org.bom</groupId><artifactId>second</artifactId><version>1</version><type>pom</type><scope>import</scope></dependency>
              </dependencies></dependencyManagement></project>"#,
        );

        assert!(BomInjectModder.apply(&mut project, &mut session).unwrap());
        let managed = &project.model.managed_dependencies;
        assert_eq!(managed.len(), 2);
        assert_eq!(managed[0].key().artifact_id, "first");
        assert_eq!(managed[1].version.as_deref(), Some("2"));
    }

    #[test]
    fn test_skips_children_of_batch_members() {
        let mut session = two_bom_session();
        session.add_project(project(
            "<project><groupId>g</groupId><artifactId>parent</artifactId><version>1</version></project>",
        ));
        let mut child = project(
            r#"<project><parent><groupId>g</groupId><artifactId>parent</artifactId><version>1</version></parent>
              <artifactId>child</artifactId></project>"#,
        );

        assert!(!BomInjectModder.apply(&mut child, &mut session).unwrap());
        assert!(child.model.managed_dependencies.is_empty());
    }
}
