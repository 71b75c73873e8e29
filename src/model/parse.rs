//! Descriptor loader: POM text into a raw [`Model`]

use super::{Dependency, Model, Parent, Plugin, Project, Property};
use crate::error::RealignError;
use roxmltree::{Document, Node};
use std::fs;
use std::path::Path;

/// First direct child element with the given local name
pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.has_tag_name(name))
}

/// Direct child elements with the given local name
pub(crate) fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |c| c.is_element() && c.has_tag_name(name))
}

/// Walks a path of direct child elements, e.g. `["build", "pluginManagement", "plugins"]`
pub(crate) fn descend<'a, 'input>(
    node: Node<'a, 'input>,
    path: &[&str],
) -> Option<Node<'a, 'input>> {
    path.iter().try_fold(node, |current, name| child(current, name))
}

fn child_text(node: Node, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|c| c.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_dependencies(section: Option<Node>) -> Vec<Dependency> {
    let Some(section) = section else {
        return Vec::new();
    };

    children(section, "dependency")
        .enumerate()
        .map(|(ordinal, node)| Dependency {
            group_id: child_text(node, "groupId").unwrap_or_default(),
            artifact_id: child_text(node, "artifactId").unwrap_or_default(),
            version: child_text(node, "version"),
            dep_type: child_text(node, "type"),
            classifier: child_text(node, "classifier"),
            scope: child_text(node, "scope"),
            origin: Some(ordinal),
        })
        .collect()
}

fn parse_plugins(section: Option<Node>) -> Vec<Plugin> {
    let Some(section) = section else {
        return Vec::new();
    };

    children(section, "plugin")
        .enumerate()
        .map(|(ordinal, node)| Plugin {
            group_id: child_text(node, "groupId"),
            artifact_id: child_text(node, "artifactId").unwrap_or_default(),
            version: child_text(node, "version"),
            origin: Some(ordinal),
        })
        .collect()
}

/// Parses descriptor text into a raw model
pub fn parse_model(content: &str) -> Result<Model, roxmltree::Error> {
    let doc = Document::parse(content)?;
    let root = doc.root_element();

    let parent = child(root, "parent").map(|p| Parent {
        group_id: child_text(p, "groupId").unwrap_or_default(),
        artifact_id: child_text(p, "artifactId").unwrap_or_default(),
        version: child_text(p, "version").unwrap_or_default(),
        relative_path: child(p, "relativePath")
            .map(|r| r.text().map(|t| t.trim().to_string()).unwrap_or_default()),
    });

    let properties = child(root, "properties")
        .map(|props| {
            props
                .children()
                .filter(|c| c.is_element())
                .map(|c| Property {
                    name: c.tag_name().name().to_string(),
                    value: c.text().map(|t| t.trim().to_string()).unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    let modules = child(root, "modules")
        .map(|m| {
            children(m, "module")
                .filter_map(|c| c.text().map(|t| t.trim().to_string()))
                .collect()
        })
        .unwrap_or_default();

    Ok(Model {
        group_id: child_text(root, "groupId"),
        artifact_id: child_text(root, "artifactId").unwrap_or_default(),
        version: child_text(root, "version"),
        packaging: child_text(root, "packaging"),
        parent,
        properties,
        dependencies: parse_dependencies(child(root, "dependencies")),
        managed_dependencies: parse_dependencies(descend(
            root,
            &["dependencyManagement", "dependencies"],
        )),
        plugins: parse_plugins(descend(root, &["build", "plugins"])),
        managed_plugins: parse_plugins(descend(root, &["build", "pluginManagement", "plugins"])),
        modules,
    })
}

/// Reads and parses a descriptor file into a [`Project`]
pub fn load_project(path: &Path) -> Result<Project, RealignError> {
    let content = fs::read_to_string(path).map_err(|e| RealignError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    project_from_str(path, content)
}

pub(crate) fn project_from_str(path: &Path, content: String) -> Result<Project, RealignError> {
    let model = parse_model(&content).map_err(|e| RealignError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if model.artifact_id.is_empty() {
        return Err(RealignError::MissingArtifactId(path.to_path_buf()));
    }

    Project::new(path.to_path_buf(), content, model)
}
