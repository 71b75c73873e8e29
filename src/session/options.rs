//! Run flags carried by the session

use crate::error::RealignError;
use crate::model::VersionlessProjectKey;
use regex::Regex;
use std::str::FromStr;

/// `groupId:artifactId` where the artifactId may be `*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatePattern {
    pub group_id: String,
    pub artifact_id: Option<String>,
}

impl CoordinatePattern {
    pub fn matches(&self, key: &VersionlessProjectKey) -> bool {
        self.group_id == key.group_id
            && self
                .artifact_id
                .as_ref()
                .map_or(true, |a| *a == key.artifact_id)
    }
}

impl FromStr for CoordinatePattern {
    type Err = RealignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some((g, a)) if !g.is_empty() && !a.is_empty() && !a.contains(':') => Ok(Self {
                group_id: g.to_string(),
                artifact_id: (a != "*").then(|| a.to_string()),
            }),
            _ => Err(RealignError::InvalidCoordinate {
                value: s.to_string(),
                expected: "groupId:artifactId or groupId:*",
            }),
        }
    }
}

/// `pattern:replacement` rewrite applied to project versions
#[derive(Debug, Clone)]
pub struct VersionModifier {
    pub pattern: Regex,
    pub replacement: String,
}

impl VersionModifier {
    pub fn parse(spec: &str) -> Result<Self, String> {
        let (pattern, replacement) = spec
            .split_once(':')
            .ok_or_else(|| format!("'{spec}' is not of the form pattern:replacement"))?;
        let pattern =
            Regex::new(pattern).map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
        Ok(Self {
            pattern,
            replacement: replacement.to_string(),
        })
    }

    pub fn apply(&self, version: &str) -> String {
        self.pattern
            .replace_all(version, self.replacement.as_str())
            .into_owned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Keep the original file when a rewrite is relocated elsewhere
    pub preserve_files: bool,
    /// Treat unmanaged versioned references as modder failures
    pub strict: bool,
    /// Drop managed entries left with nothing but coordinates
    pub normalize_bom_usage: bool,
    pub version_suffix: Option<String>,
    pub version_modifier: Option<VersionModifier>,
    pub removed_plugins: Vec<CoordinatePattern>,
    pub removed_tests: Vec<CoordinatePattern>,
}

impl SessionOptions {
    /// Applies the modifier then the suffix; already-modified versions are unchanged
    pub fn modify_version(&self, version: &str) -> String {
        let mut result = match &self.version_modifier {
            Some(modifier) => modifier.apply(version),
            None => version.to_string(),
        };
        if let Some(suffix) = self.version_suffix.as_deref().filter(|s| !s.is_empty()) {
            if !result.ends_with(suffix) {
                result.push_str(suffix);
            }
        }
        result
    }

    pub fn modifies_versions(&self) -> bool {
        self.version_modifier.is_some()
            || self.version_suffix.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_pattern() {
        let exact: CoordinatePattern = "org.foo:bar".parse().unwrap();
        let wildcard: CoordinatePattern = "org.foo:*".parse().unwrap();
        let key = VersionlessProjectKey::new("org.foo", "bar");
        let other = VersionlessProjectKey::new("org.foo", "baz");

        assert!(exact.matches(&key));
        assert!(!exact.matches(&other));
        assert!(wildcard.matches(&other));
        assert!("org.foo".parse::<CoordinatePattern>().is_err());
    }

    #[test]
    fn test_modify_version_is_idempotent() {
        let options = SessionOptions {
            version_suffix: Some("-rebuild-1".to_string()),
            version_modifier: Some(VersionModifier::parse("-SNAPSHOT$:").unwrap()),
            ..Default::default()
        };
        assert_eq!(options.modify_version("1.0-SNAPSHOT"), "1.0-rebuild-1");
        assert_eq!(options.modify_version("1.0-rebuild-1"), "1.0-rebuild-1");
        assert!(options.modifies_versions());
    }

    #[test]
    fn test_modifier_rejects_bad_spec() {
        assert!(VersionModifier::parse("no-separator").is_err());
        assert!(VersionModifier::parse("([:x").is_err());
    }
}
