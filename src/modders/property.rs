use super::ProjectModder;
use crate::error::ErrorScope;
use crate::model::Project;
use crate::session::Session;
use anyhow::Result;

/// Overrides declared `<properties>` with registered property mappings
pub struct PropertyModder;

impl ProjectModder for PropertyModder {
    fn id(&self) -> &'static str {
        "property"
    }

    fn description(&self) -> &'static str {
        "Overrides project properties with mapped values"
    }

    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool> {
        if session.mappings().is_empty() {
            return Ok(false);
        }
        let pom = project.pom().to_path_buf();
        let mut changes = Vec::new();
        let mut cyclic = Vec::new();

        for property in project.model.properties.iter_mut() {
            if !session.mappings().contains(&property.name) {
                continue;
            }
            match session.mappings().get(&property.name) {
                Some(value) if value != property.value => {
                    changes.push(format!("property {}: {} -> {}", property.name, property.value, value));
                    property.value = value;
                }
                Some(_) => {}
                None => cyclic.push(property.name.clone()),
            }
        }

        for name in cyclic {
            session.add_error(
                ErrorScope::file(&pom),
                anyhow::anyhow!("Property mapping '{}' refers to itself", name),
            );
        }
        for change in &changes {
            session.record_change(&pom, self.id(), change.clone());
        }
        Ok(!changes.is_empty())
    }
}
