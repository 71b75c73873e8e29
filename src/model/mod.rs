//! Raw descriptor model
//!
//! A deliberately small object model of a POM: only the fields the realignment
//! pipeline reads or rewrites. Everything else stays in the original text and
//! is carried through by the rewriter untouched.
//!
//! Elements parsed from a file remember their ordinal position in their section
//! (`origin`), which is how the rewriter maps model entries back onto nodes.

pub mod parse;
pub mod project;
pub mod version;

use crate::error::RealignError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use parse::{load_project, parse_model};
pub use project::{EffectiveModel, Project};
pub use version::{MavenVersionComparator, VersionComparator};

/// Default groupId for plugins that omit one
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

/// `groupId:artifactId`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VersionlessProjectKey {
    pub group_id: String,
    pub artifact_id: String,
}

impl VersionlessProjectKey {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn with_version(&self, version: impl Into<String>) -> ProjectKey {
        ProjectKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: version.into(),
        }
    }
}

impl fmt::Display for VersionlessProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for VersionlessProjectKey {
    type Err = RealignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [g, a] if !g.is_empty() && !a.is_empty() => Ok(Self::new(*g, *a)),
            _ => Err(RealignError::InvalidCoordinate {
                value: s.to_string(),
                expected: "groupId:artifactId",
            }),
        }
    }
}

/// `groupId:artifactId:version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProjectKey {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ProjectKey {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    pub fn versionless(&self) -> VersionlessProjectKey {
        VersionlessProjectKey::new(&self.group_id, &self.artifact_id)
    }

    pub fn with_version(&self, version: impl Into<String>) -> ProjectKey {
        self.versionless().with_version(version)
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl FromStr for ProjectKey {
    type Err = RealignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [g, a, v] if !g.is_empty() && !a.is_empty() && !v.is_empty() => {
                Ok(Self::new(*g, *a, *v))
            }
            _ => Err(RealignError::InvalidCoordinate {
                value: s.to_string(),
                expected: "groupId:artifactId:version",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parent {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub relative_path: Option<String>,
}

impl Parent {
    pub fn key(&self) -> ProjectKey {
        ProjectKey::new(&self.group_id, &self.artifact_id, &self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub dep_type: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    #[serde(skip)]
    pub origin: Option<usize>,
}

impl Dependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            dep_type: None,
            classifier: None,
            scope: None,
            origin: None,
        }
    }

    /// A managed `pom`-typed, `import`-scoped BOM reference
    pub fn bom_import(key: &ProjectKey) -> Self {
        Self {
            version: Some(key.version.clone()),
            dep_type: Some("pom".to_string()),
            scope: Some("import".to_string()),
            ..Self::new(&key.group_id, &key.artifact_id)
        }
    }

    pub fn key(&self) -> VersionlessProjectKey {
        VersionlessProjectKey::new(&self.group_id, &self.artifact_id)
    }

    pub fn is_import(&self) -> bool {
        self.scope.as_deref() == Some("import") && self.dep_type.as_deref() == Some("pom")
    }

    pub fn is_test(&self) -> bool {
        self.scope.as_deref() == Some("test")
    }

    /// True when the entry carries nothing beyond its coordinates
    pub fn is_bare(&self) -> bool {
        self.version.is_none()
            && self.scope.is_none()
            && self.classifier.is_none()
            && matches!(self.dep_type.as_deref(), None | Some("jar"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plugin {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    #[serde(skip)]
    pub origin: Option<usize>,
}

impl Plugin {
    pub fn key(&self) -> VersionlessProjectKey {
        VersionlessProjectKey::new(
            self.group_id.as_deref().unwrap_or(DEFAULT_PLUGIN_GROUP),
            &self.artifact_id,
        )
    }
}

/// The mutable raw model of one descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Model {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<Parent>,
    pub properties: Vec<Property>,
    pub dependencies: Vec<Dependency>,
    pub managed_dependencies: Vec<Dependency>,
    pub plugins: Vec<Plugin>,
    pub managed_plugins: Vec<Plugin>,
    pub modules: Vec<String>,
}

impl Model {
    /// groupId, falling back to the parent's
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// version, falling back to the parent's
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.version.as_str()))
    }

    pub fn key(&self) -> Option<ProjectKey> {
        Some(ProjectKey::new(
            self.effective_group_id()?,
            &self.artifact_id,
            self.effective_version()?,
        ))
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}
