//! End-of-run reports over the session's accumulated state

pub mod capture;
mod xml;

use crate::session::Session;
use anyhow::{Context, Result};
use capture::write_coordinates;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use xml::XmlOut;

pub use capture::{Capture, CaptureBuilder, CapturedEntry};

pub trait Reporter: Send + Sync {
    fn id(&self) -> &'static str;

    fn file_name(&self) -> &'static str;

    /// Report body, or `None` when there is nothing to report
    fn render(&self, session: &Session, capture: &Capture) -> Result<Option<String>>;
}

/// Per-scope error listing
pub struct ErrorReporter;

impl Reporter for ErrorReporter {
    fn id(&self) -> &'static str {
        "errors"
    }

    fn file_name(&self) -> &'static str {
        "errors.log"
    }

    fn render(&self, session: &Session, _capture: &Capture) -> Result<Option<String>> {
        if !session.has_errors() {
            return Ok(None);
        }
        let mut out = String::new();
        for (scope, errors) in session.errors() {
            writeln!(out, "{}:", scope)?;
            for error in errors {
                writeln!(out, "  - {:#}", error)?;
            }
        }
        Ok(Some(out))
    }
}

/// Unmanaged dependency versions per file
pub struct MissingVersionsReporter;

impl Reporter for MissingVersionsReporter {
    fn id(&self) -> &'static str {
        "missing-versions"
    }

    fn file_name(&self) -> &'static str {
        "missing-versions.log"
    }

    fn render(&self, session: &Session, _capture: &Capture) -> Result<Option<String>> {
        if session.missing_versions().is_empty() {
            return Ok(None);
        }
        let mut out = String::new();
        for (pom, entries) in session.missing_versions() {
            writeln!(out, "{}:", pom.display())?;
            for entry in entries {
                match &entry.version {
                    Some(version) => writeln!(out, "  {}:{}", entry.key, version)?,
                    None => writeln!(out, "  {}", entry.key)?,
                }
            }
        }
        Ok(Some(out))
    }
}

/// Missing parents with the descriptors that reference them
pub struct MissingParentsReporter;

impl Reporter for MissingParentsReporter {
    fn id(&self) -> &'static str {
        "missing-parents"
    }

    fn file_name(&self) -> &'static str {
        "missing-parents.xml"
    }

    fn render(&self, session: &Session, _capture: &Capture) -> Result<Option<String>> {
        if session.missing_parents().is_empty() {
            return Ok(None);
        }
        let mut out = XmlOut::new()?;
        out.start("missingParents")?;
        for (parent, poms) in session.missing_parents() {
            out.start("parent")?;
            write_coordinates(&mut out, &parent.versionless(), Some(&parent.version))?;
            out.start("referencedBy")?;
            for pom in poms {
                out.text_element("pom", &pom.display().to_string())?;
            }
            out.end("referencedBy")?;
            out.end("parent")?;
        }
        out.end("missingParents")?;
        Ok(Some(out.finish()?))
    }
}

/// Plugin management snippet covering every plugin the toolchain lacks
pub struct MissingPluginManagementReporter;

impl Reporter for MissingPluginManagementReporter {
    fn id(&self) -> &'static str {
        "missing-plugin-management"
    }

    fn file_name(&self) -> &'static str {
        "missing-pluginManagement.xml"
    }

    fn render(&self, _session: &Session, capture: &Capture) -> Result<Option<String>> {
        if capture.plugins.is_empty() {
            return Ok(None);
        }
        let mut out = XmlOut::new()?;
        out.start("pluginManagement")?;
        out.start("plugins")?;
        for entry in &capture.plugins {
            out.start("plugin")?;
            write_coordinates(&mut out, &entry.key, entry.version.as_deref())?;
            out.end("plugin")?;
        }
        out.end("plugins")?;
        out.end("pluginManagement")?;
        Ok(Some(out.finish()?))
    }
}

pub struct ReportWriter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reporters(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    /// Writes every non-empty report into `dir`; failures are collected, not fatal
    pub fn write_all(
        &self,
        session: &Session,
        capture: &Capture,
        dir: &Path,
    ) -> (Vec<PathBuf>, Vec<anyhow::Error>) {
        let mut written = Vec::new();
        let mut failures = Vec::new();
        for reporter in &self.reporters {
            match self.write_one(reporter.as_ref(), session, capture, dir) {
                Ok(Some(path)) => written.push(path),
                Ok(None) => debug!(report = reporter.id(), "Nothing to report"),
                Err(e) => failures.push(e.context(format!("Report '{}' failed", reporter.id()))),
            }
        }
        if !written.is_empty() {
            info!(dir = %dir.display(), count = written.len(), "Wrote reports");
        }
        (written, failures)
    }

    fn write_one(
        &self,
        reporter: &dyn Reporter,
        session: &Session,
        capture: &Capture,
        dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let Some(body) = reporter.render(session, capture)? else {
            return Ok(None);
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
        let path = dir.join(reporter.file_name());
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(Some(path))
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self {
            reporters: vec![
                Box::new(ErrorReporter),
                Box::new(MissingVersionsReporter),
                Box::new(MissingParentsReporter),
                Box::new(MissingPluginManagementReporter),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorScope;
    use crate::model::{ProjectKey, VersionlessProjectKey};
    use crate::session::SessionOptions;
    use tempfile::TempDir;

    fn populated_session() -> Session {
        let mut session = Session::new(SessionOptions::default(), "/tmp/work");
        session.add_error(ErrorScope::Global, anyhow::anyhow!("bad bom"));
        session.add_error(ErrorScope::file("a/pom.xml"), anyhow::anyhow!("bad pom"));
        session.add_missing_version(
            Path::new("a/pom.xml"),
            VersionlessProjectKey::new("org.foo", "bar"),
            Some("1.0".to_string()),
        );
        session.add_missing_parent(Path::new("a/pom.xml"), ProjectKey::new("p", "parent", "1"));
        session.add_unmanaged_plugin(
            Path::new("a/pom.xml"),
            VersionlessProjectKey::new("org.acme", "acme-plugin"),
            Some("0.4".to_string()),
        );
        session
    }

    #[test]
    fn test_error_log_groups_by_scope() {
        let session = populated_session();
        let body = ErrorReporter
            .render(&session, &Capture::default())
            .unwrap()
            .unwrap();
        assert!(body.starts_with("GLOBAL:\n  - bad bom\n"));
        assert!(body.contains("a/pom.xml:\n  - bad pom"));
    }

    #[test]
    fn test_empty_session_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let session = Session::new(SessionOptions::default(), temp.path());
        let (written, failures) =
            ReportWriter::default().write_all(&session, &Capture::default(), temp.path());
        assert!(written.is_empty());
        assert!(failures.is_empty());
    }

    #[test]
    fn test_writes_all_reports() {
        let temp = TempDir::new().unwrap();
        let session = populated_session();
        let capture = CaptureBuilder::default().build(&session);
        let (written, failures) =
            ReportWriter::default().write_all(&session, &capture, &temp.path().join("reports"));
        assert!(failures.is_empty());
        assert_eq!(written.len(), 4);

        let versions = fs::read_to_string(temp.path().join("reports/missing-versions.log")).unwrap();
        assert!(versions.contains("  org.foo:bar:1.0"));

        let parents = fs::read_to_string(temp.path().join("reports/missing-parents.xml")).unwrap();
        let doc = roxmltree::Document::parse(&parents).unwrap();
        assert_eq!(doc.descendants().filter(|n| n.has_tag_name("pom")).count(), 1);

        let plugins =
            fs::read_to_string(temp.path().join("reports/missing-pluginManagement.xml")).unwrap();
        assert!(plugins.contains("<artifactId>acme-plugin</artifactId>"));
        assert!(plugins.contains("<version>0.4</version>"));
    }
}
