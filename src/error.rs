//! Error types shared across the realignment pipeline
//!
//! Two channels exist: [`RealignError`] halts processing of the current file,
//! while record-and-continue diagnostics are accumulated on the session under
//! an [`ErrorScope`]. [`MultiError`] packages an ordered list of independent
//! failures under one message for reporting.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Hard errors that abort work on a single descriptor (never the batch)
#[derive(Debug, Error)]
pub enum RealignError {
    #[error("Invalid coordinate '{value}': expected {expected}")]
    InvalidCoordinate {
        value: String,
        expected: &'static str,
    },

    #[error("Failed to parse descriptor {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Descriptor {0} does not declare an artifactId")]
    MissingArtifactId(PathBuf),

    #[error("Descriptor {0} has no resolvable groupId or version")]
    IncompleteCoordinate(PathBuf),

    #[error("Failed to back up {path} to {backup}: {source}")]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Strict mode: {count} versioned reference(s) in {path} have no managed version")]
    StrictMissingVersions { path: PathBuf, count: usize },

    #[error("Failed to load parent {parent} of {path}: {message}")]
    AncestryLoad {
        path: PathBuf,
        parent: String,
        message: String,
    },

    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },
}

impl RealignError {
    /// Scope a diagnostic for this error is filed under
    pub fn scope(&self) -> ErrorScope {
        match self {
            RealignError::Parse { path, .. }
            | RealignError::MissingArtifactId(path)
            | RealignError::IncompleteCoordinate(path)
            | RealignError::Backup { path, .. }
            | RealignError::Write { path, .. }
            | RealignError::StrictMissingVersions { path, .. }
            | RealignError::AncestryLoad { path, .. } => ErrorScope::File(path.clone()),
            RealignError::InvalidCoordinate { .. } | RealignError::Download { .. } => {
                ErrorScope::Global
            }
        }
    }
}

/// Key under which accumulated diagnostics are filed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorScope {
    /// Problems not tied to a single descriptor
    Global,
    File(PathBuf),
}

impl ErrorScope {
    pub fn file(path: impl AsRef<Path>) -> Self {
        ErrorScope::File(path.as_ref().to_path_buf())
    }
}

impl fmt::Display for ErrorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorScope::Global => write!(f, "GLOBAL"),
            ErrorScope::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Aggregate of independent failures collected during a run
#[derive(Debug, Error)]
#[error("{message} ({} problem(s))", .causes.len())]
pub struct MultiError {
    pub message: String,
    pub causes: Vec<anyhow::Error>,
}

impl MultiError {
    pub fn new(message: impl Into<String>, causes: Vec<anyhow::Error>) -> Self {
        Self {
            message: message.into(),
            causes,
        }
    }

    /// Renders the top-level message followed by every cause chain
    pub fn render(&self) -> String {
        let mut out = self.to_string();
        for (i, cause) in self.causes.iter().enumerate() {
            out.push_str(&format!("\n  {}. {:#}", i + 1, cause));
        }
        out
    }
}
