//! Post-modification invariant checks
//!
//! Verifiers never fail the run; violations are recorded on the session.

pub mod rules;

use crate::model::Project;
use crate::session::Session;
use tracing::debug;

pub use rules::{BomRealignVerifier, ParentVerifier, ToolchainVerifier};

pub trait ProjectVerifier: Send + Sync {
    fn id(&self) -> &'static str;

    fn verify(&self, project: &Project, session: &mut Session);
}

pub struct Verifier {
    rules: Vec<Box<dyn ProjectVerifier>>,
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Box<dyn ProjectVerifier>>) -> Self {
        Self { rules }
    }

    /// Runs every rule against a changed project; returns how many errors were added
    pub fn verify(&self, project: &Project, session: &mut Session) -> usize {
        let before = session.error_count();
        for rule in &self.rules {
            rule.verify(project, session);
        }
        let added = session.error_count() - before;
        if added > 0 {
            debug!(pom = %project.pom().display(), added, "Verification problems");
        }
        added
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(BomRealignVerifier),
                Box::new(ToolchainVerifier),
                Box::new(ParentVerifier),
            ],
        }
    }
}
