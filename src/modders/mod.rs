//! Per-project modification pipeline
//!
//! Modders run in the fixed order of [`ModderPipeline::default`]; a selection
//! filters that table but never reorders it. Each modder reports whether it
//! changed the project and must report `false` when re-run on its own output.

pub mod bom;
pub mod inject;
pub mod property;
pub mod relocation;
pub mod removal;
pub mod toolchain;
pub mod version;

use crate::error::ErrorScope;
use crate::model::Project;
use crate::session::Session;
use anyhow::Result;
use tracing::{debug, warn};

pub use bom::BomRealignModder;
pub use inject::BomInjectModder;
pub use property::PropertyModder;
pub use relocation::RelocationModder;
pub use removal::{RemovePluginsModder, RemoveTestsModder};
pub use toolchain::ToolchainModder;
pub use version::VersionModder;

pub trait ProjectModder: Send + Sync {
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Mutates the project in place; returns whether anything changed
    fn apply(&self, project: &mut Project, session: &mut Session) -> Result<bool>;
}

pub struct ModderPipeline {
    modders: Vec<Box<dyn ProjectModder>>,
}

impl ModderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modders(modders: Vec<Box<dyn ProjectModder>>) -> Self {
        Self { modders }
    }

    /// Keeps only the named modders, in registry order; unknown ids are returned as the error
    pub fn select<S: AsRef<str>>(ids: &[S]) -> Result<Self, String> {
        let all = Self::default();
        if let Some(unknown) = ids
            .iter()
            .map(AsRef::as_ref)
            .find(|id| !all.modders.iter().any(|m| m.id() == *id))
        {
            return Err(unknown.to_string());
        }
        let modders = all
            .modders
            .into_iter()
            .filter(|m| ids.iter().any(|id| id.as_ref() == m.id()))
            .collect();
        Ok(Self { modders })
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.modders.iter().map(|m| m.id()).collect()
    }

    /// One `id: description` line per modder, in run order
    pub fn describe(&self) -> String {
        self.modders
            .iter()
            .map(|m| format!("{}: {}", m.id(), m.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Runs every modder; a failing modder is recorded and counts as no change
    pub fn apply(&self, project: &mut Project, session: &mut Session) -> bool {
        let mut changed = false;
        for modder in &self.modders {
            match modder.apply(project, session) {
                Ok(true) => {
                    debug!(modder = modder.id(), pom = %project.pom().display(), "Project modified");
                    changed = true;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(modder = modder.id(), pom = %project.pom().display(), error = %e, "Modder failed");
                    session.add_error(
                        ErrorScope::file(project.pom()),
                        e.context(format!("Modder '{}' failed", modder.id())),
                    );
                }
            }
        }
        changed
    }
}

impl Default for ModderPipeline {
    fn default() -> Self {
        Self {
            modders: vec![
                Box::new(RelocationModder),
                Box::new(VersionModder),
                Box::new(PropertyModder),
                Box::new(RemovePluginsModder),
                Box::new(RemoveTestsModder),
                Box::new(ToolchainModder),
                Box::new(BomRealignModder),
                Box::new(BomInjectModder),
            ],
        }
    }
}

/// Interpolates a raw value against the project's effective view, if computed
pub(crate) fn resolved(project: &Project, value: &str) -> String {
    project
        .cached_effective()
        .map(|e| e.interpolate(value))
        .unwrap_or_else(|| value.to_string())
}
