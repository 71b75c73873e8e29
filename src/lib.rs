//! pomalign - realigns POM versions against BOM catalogs
//!
//! Given a tree of Maven build descriptors and one or more BOMs (plus an
//! optional toolchain descriptor managing plugins), pomalign strips every
//! explicit version the catalogs already manage, imports the BOMs, applies
//! relocations and version policy, and writes the descriptors back with
//! minimal textual diffs.
//!
//! # Core Concepts
//!
//! - **Session**: one per run, threaded explicitly through every stage; owns
//!   the first-wins version catalog, relocations, property mappings, the
//!   loaded batch and all accumulated diagnostics
//! - **Modders**: ordered, idempotent per-project transformations
//! - **Verifiers**: non-fatal post-modification checks
//! - **Rewriter**: span edits over the original text, originals backed up first
//! - **Capture**: a synthesized descriptor managing everything left unresolved
//!
//! # Example Usage
//!
//! ```no_run
//! use pomalign::{RealignConfig, VersionManager};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut config = RealignConfig::new("./my-project");
//! config.boms.push("./platform-bom-7.pom".to_string());
//!
//! let summary = VersionManager::new(config)?.run()?;
//! println!("{} descriptor(s) rewritten", summary.written.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`model`]: descriptor object model, loader and version ordering
//! - [`session`]: catalog, relocations, mappings and diagnostics
//! - [`resolve`]: workspace resolution, ancestry reconstruction, catalog download
//! - [`modders`] / [`verify`]: the modify and verify pipelines
//! - [`rewrite`]: format-preserving writer
//! - [`report`]: end-of-run reports and the capture descriptor
//! - [`manager`]: drives a full run

pub mod cli;
pub mod config;
pub mod error;
pub mod manager;
pub mod modders;
pub mod model;
pub mod report;
pub mod resolve;
pub mod rewrite;
pub mod session;
pub mod util;
pub mod verify;

pub use config::{ConfigError, RealignConfig};
pub use error::{ErrorScope, MultiError, RealignError};
pub use manager::{RunSummary, VersionManager};
pub use modders::{ModderPipeline, ProjectModder};
pub use model::{Project, ProjectKey, VersionlessProjectKey};
pub use report::{Capture, CaptureBuilder, ReportWriter, Reporter};
pub use resolve::{LocalRepository, ModelResolver, RepositoryResolver};
pub use rewrite::PomWriter;
pub use session::{Session, SessionOptions};
pub use util::{init_from_env, init_logging, LoggingConfig};
pub use verify::{ProjectVerifier, Verifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_pomalign() {
        assert_eq!(NAME, "pomalign");
    }
}
