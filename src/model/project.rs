//! A loaded descriptor plus its lazily computed effective view

use super::{Model, ProjectKey};
use crate::error::RealignError;
use crate::resolve::ModelResolver;
use regex::Regex;
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Upper bound on nested `${...}` rounds
const MAX_INTERPOLATION_DEPTH: usize = 10;

fn expression_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"))
}

/// Interpolated identity and merged ancestry properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveModel {
    pub key: ProjectKey,
    pub properties: HashMap<String, String>,
}

impl EffectiveModel {
    /// Expands `${name}` expressions; unknown expressions are left as written
    pub fn interpolate(&self, value: &str) -> String {
        interpolate_with(value, &self.properties)
    }
}

fn interpolate_with(value: &str, properties: &HashMap<String, String>) -> String {
    let re = expression_regex();
    let mut current = value.to_string();
    for _ in 0..MAX_INTERPOLATION_DEPTH {
        if !re.is_match(&current) {
            break;
        }
        let next = re
            .replace_all(&current, |caps: &regex::Captures| {
                properties
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

#[derive(Debug, Clone)]
pub struct Project {
    pom: PathBuf,
    original: String,
    original_key: ProjectKey,
    pub model: Model,
    effective: OnceCell<EffectiveModel>,
}

impl Project {
    pub fn new(pom: PathBuf, original: String, model: Model) -> Result<Self, RealignError> {
        let original_key = model
            .key()
            .ok_or_else(|| RealignError::IncompleteCoordinate(pom.clone()))?;
        Ok(Self {
            pom,
            original,
            original_key,
            model,
            effective: OnceCell::new(),
        })
    }

    pub fn pom(&self) -> &Path {
        &self.pom
    }

    /// Descriptor text as loaded from disk
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Coordinate at load time, before any modder ran
    pub fn original_key(&self) -> &ProjectKey {
        &self.original_key
    }

    /// Coordinate reflecting in-memory modifications
    pub fn key(&self) -> ProjectKey {
        self.model
            .key()
            .unwrap_or_else(|| self.original_key.clone())
    }

    /// Effective view if it has already been computed
    pub fn cached_effective(&self) -> Option<&EffectiveModel> {
        self.effective.get()
    }

    /// Effective view over the ancestry chain, computed on first use and cached
    pub fn effective(&self, resolver: &dyn ModelResolver) -> &EffectiveModel {
        self.effective
            .get_or_init(|| compute_effective(&self.model, &self.original_key, resolver))
    }
}

fn compute_effective(
    model: &Model,
    fallback_key: &ProjectKey,
    resolver: &dyn ModelResolver,
) -> EffectiveModel {
    let mut chain: Vec<Model> = Vec::new();
    let mut seen = HashSet::new();
    let mut next = model.parent.as_ref().map(|p| p.key());
    while let Some(key) = next.take() {
        if !seen.insert(key.clone()) {
            break;
        }
        if let Some(parent) = resolver.resolve(&key) {
            next = parent.parent.as_ref().map(|p| p.key());
            chain.push(parent);
        }
    }

    // Root-most ancestor first so descendants override
    let mut properties = HashMap::new();
    for ancestor in chain.iter().rev() {
        for prop in &ancestor.properties {
            properties.insert(prop.name.clone(), prop.value.clone());
        }
    }
    for prop in &model.properties {
        properties.insert(prop.name.clone(), prop.value.clone());
    }

    let key = model.key().unwrap_or_else(|| fallback_key.clone());
    for prefix in ["project", "pom"] {
        properties.insert(format!("{prefix}.groupId"), key.group_id.clone());
        properties.insert(format!("{prefix}.artifactId"), key.artifact_id.clone());
        properties.insert(format!("{prefix}.version"), key.version.clone());
    }
    if let Some(parent) = &model.parent {
        properties.insert("project.parent.groupId".to_string(), parent.group_id.clone());
        properties.insert("project.parent.version".to_string(), parent.version.clone());
    }

    let key = ProjectKey::new(
        interpolate_with(&key.group_id, &properties),
        key.artifact_id.clone(),
        interpolate_with(&key.version, &properties),
    );
    properties.insert("project.version".to_string(), key.version.clone());
    properties.insert("project.groupId".to_string(), key.group_id.clone());

    EffectiveModel { key, properties }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_model;
    use std::collections::HashMap;

    struct MapResolver(HashMap<ProjectKey, Model>);

    impl ModelResolver for MapResolver {
        fn resolve(&self, key: &ProjectKey) -> Option<Model> {
            self.0.get(key).cloned()
        }
    }

    fn project(content: &str) -> Project {
        Project::new(
            PathBuf::from("pom.xml"),
            content.to_string(),
            parse_model(content).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_effective_properties_inherit_and_override() {
        let parent = parse_model(
            r#"<project><groupId>g</groupId><artifactId>parent</artifactId><version>1</version>
               <properties><a>parent-a</a><b>parent-b</b><revision>5.0</revision></properties></project>"#,
        )
        .unwrap();
        let mut models = HashMap::new();
        models.insert(ProjectKey::new("g", "parent", "1"), parent);
        let resolver = MapResolver(models);

        let child = project(
            r#"<project><parent><groupId>g</groupId><artifactId>parent</artifactId><version>1</version></parent>
               <artifactId>child</artifactId><version>${revision}</version>
               <properties><b>child-b</b></properties></project>"#,
        );

        let effective = child.effective(&resolver);
        assert_eq!(effective.properties["a"], "parent-a");
        assert_eq!(effective.properties["b"], "child-b");
        assert_eq!(effective.key, ProjectKey::new("g", "child", "5.0"));
        assert_eq!(effective.interpolate("${project.version}-x"), "5.0-x");
        assert_eq!(effective.interpolate("${unknown}"), "${unknown}");
    }

    #[test]
    fn test_effective_view_is_cached() {
        let child = project("<project><groupId>g</groupId><artifactId>a</artifactId><version>1</version></project>");
        let resolver = MapResolver(HashMap::new());
        let first = child.effective(&resolver) as *const EffectiveModel;
        let second = child.effective(&resolver) as *const EffectiveModel;
        assert_eq!(first, second);
    }

    #[test]
    fn test_interpolation_stops_on_self_reference() {
        let mut props = HashMap::new();
        props.insert("a".to_string(), "${a}".to_string());
        assert_eq!(interpolate_with("${a}", &props), "${a}");
    }
}
