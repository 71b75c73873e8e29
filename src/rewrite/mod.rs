//! Format-preserving descriptor rewriter
//!
//! The original text is re-parsed and compared against the mutated model;
//! only the elements whose values differ are touched. Comments, attribute
//! order, whitespace and anything the model does not know about (plugin
//! configuration, profiles, reporting) are carried through byte for byte.

mod edit;

use crate::error::RealignError;
use crate::model::parse::{child, children, descend};
use crate::model::{parse_model, Dependency, Model, Plugin, Project};
use crate::resolve::LocalRepository;
use crate::session::Session;
use edit::{escape, EditSet};
use roxmltree::{Document, Node};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fields in the order they are written inside a section entry
trait SectionEntry {
    const ELEMENT: &'static str;

    fn origin(&self) -> Option<usize>;

    fn fields(&self) -> Vec<(&'static str, Option<&str>)>;
}

impl SectionEntry for Dependency {
    const ELEMENT: &'static str = "dependency";

    fn origin(&self) -> Option<usize> {
        self.origin
    }

    fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("groupId", Some(self.group_id.as_str())),
            ("artifactId", Some(self.artifact_id.as_str())),
            ("version", self.version.as_deref()),
            ("type", self.dep_type.as_deref()),
            ("classifier", self.classifier.as_deref()),
            ("scope", self.scope.as_deref()),
        ]
    }
}

impl SectionEntry for Plugin {
    const ELEMENT: &'static str = "plugin";

    fn origin(&self) -> Option<usize> {
        self.origin
    }

    fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("groupId", self.group_id.as_deref()),
            ("artifactId", Some(self.artifact_id.as_str())),
            ("version", self.version.as_deref()),
        ]
    }
}

const PROJECT_ORDER: &[&str] = &[
    "modelVersion",
    "parent",
    "groupId",
    "artifactId",
    "version",
    "packaging",
];
const PARENT_ORDER: &[&str] = &["groupId", "artifactId", "version"];

/// Renders the project's current model over its original text
pub fn render(project: &Project) -> Result<String, RealignError> {
    let source = project.original();
    let parse_error = |message: String| RealignError::Parse {
        path: project.pom().to_path_buf(),
        message,
    };
    let doc = Document::parse(source).map_err(|e| parse_error(e.to_string()))?;
    let original = parse_model(source).map_err(|e| parse_error(e.to_string()))?;
    let current = &project.model;
    if original == *current {
        return Ok(source.to_string());
    }

    let root = doc.root_element();
    let mut edits = EditSet::new(source, root);

    sync_field(&mut edits, root, "groupId", original.group_id.as_deref(), current.group_id.as_deref(), PROJECT_ORDER);
    sync_field(&mut edits, root, "artifactId", Some(original.artifact_id.as_str()), Some(current.artifact_id.as_str()), PROJECT_ORDER);
    sync_field(&mut edits, root, "version", original.version.as_deref(), current.version.as_deref(), PROJECT_ORDER);
    sync_field(&mut edits, root, "packaging", original.packaging.as_deref(), current.packaging.as_deref(), PROJECT_ORDER);

    if let (Some(node), Some(old), Some(new)) =
        (child(root, "parent"), &original.parent, &current.parent)
    {
        sync_field(&mut edits, node, "groupId", Some(old.group_id.as_str()), Some(new.group_id.as_str()), PARENT_ORDER);
        sync_field(&mut edits, node, "artifactId", Some(old.artifact_id.as_str()), Some(new.artifact_id.as_str()), PARENT_ORDER);
        sync_field(&mut edits, node, "version", Some(old.version.as_str()), Some(new.version.as_str()), PARENT_ORDER);
    }

    sync_properties(&mut edits, root, &original, current);

    let orphans = sync_section(
        &mut edits,
        descend(root, &["dependencyManagement", "dependencies"]),
        &original.managed_dependencies,
        &current.managed_dependencies,
    );
    create_section(
        &mut edits,
        root,
        &["dependencyManagement", "dependencies"],
        &orphans,
        &["dependencies", "build"],
    );

    let orphans = sync_section(
        &mut edits,
        child(root, "dependencies"),
        &original.dependencies,
        &current.dependencies,
    );
    create_section(&mut edits, root, &["dependencies"], &orphans, &["build"]);

    let orphans = sync_section(
        &mut edits,
        descend(root, &["build", "pluginManagement", "plugins"]),
        &original.managed_plugins,
        &current.managed_plugins,
    );
    create_section(&mut edits, root, &["build", "pluginManagement", "plugins"], &orphans, &[]);

    let orphans = sync_section(
        &mut edits,
        descend(root, &["build", "plugins"]),
        &original.plugins,
        &current.plugins,
    );
    create_section(&mut edits, root, &["build", "plugins"], &orphans, &[]);

    if edits.is_empty() {
        return Ok(source.to_string());
    }
    Ok(edits.apply())
}

/// Brings one child element of `node` in line with the model value
fn sync_field(
    edits: &mut EditSet,
    node: Node,
    name: &str,
    old: Option<&str>,
    new: Option<&str>,
    order: &[&str],
) {
    if old == new {
        return;
    }
    let existing = child(node, name);
    match (existing, new) {
        (Some(element), Some(value)) => edits.set_text(element, value),
        (Some(element), None) => edits.remove_element(element),
        (None, Some(value)) => {
            let block = format!("<{name}>{}</{name}>", escape(value));
            let position = order.iter().position(|n| *n == name).unwrap_or(order.len());
            let anchor = order[..position]
                .iter()
                .rev()
                .find_map(|n| child(node, n));
            match anchor {
                Some(anchor) => {
                    let indent = edits.indent_of(anchor);
                    edits.insert_after(anchor, &block, &indent);
                }
                None => edits.insert_first_child(node, &block),
            }
        }
        (None, None) => {}
    }
}

fn sync_properties(edits: &mut EditSet, root: Node, original: &Model, current: &Model) {
    if original.properties == current.properties {
        return;
    }
    let Some(section) = child(root, "properties") else {
        let entries: Vec<String> = current
            .properties
            .iter()
            .map(|p| format!("<{0}>{1}</{0}>", p.name, escape(&p.value)))
            .collect();
        if entries.is_empty() {
            return;
        }
        let indent = edits.child_indent(root);
        let inner = format!("{indent}{}", edits.unit);
        let nl = edits.newline;
        let block = format!(
            "<properties>{nl}{inner}{}{nl}{indent}</properties>",
            entries.join(&format!("{nl}{inner}"))
        );
        insert_in_root(edits, root, &block, &["dependencyManagement", "dependencies", "build"]);
        return;
    };

    let element = |name: &str| {
        section
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == name)
    };
    for property in &current.properties {
        match element(&property.name) {
            Some(node) => {
                if original.property(&property.name) != Some(property.value.as_str()) {
                    edits.set_text(node, &property.value);
                }
            }
            None => edits.insert_last_child(
                section,
                &format!("<{0}>{1}</{0}>", property.name, escape(&property.value)),
            ),
        }
    }
    for property in &original.properties {
        if current.property(&property.name).is_none() {
            if let Some(node) = element(&property.name) {
                edits.remove_element(node);
            }
        }
    }
}

/// Syncs existing entries of one section; returns entries that need a section created
fn sync_section<'m, T: SectionEntry>(
    edits: &mut EditSet,
    section: Option<Node>,
    original: &[T],
    current: &'m [T],
) -> Vec<&'m T> {
    let Some(section) = section else {
        return current.iter().filter(|e| e.origin().is_none()).collect();
    };
    let nodes: Vec<Node> = children(section, T::ELEMENT).collect();
    let order: Vec<&str> = current
        .first()
        .or(original.first())
        .map(|e| e.fields().into_iter().map(|(n, _)| n).collect())
        .unwrap_or_default();

    let kept: HashSet<usize> = current.iter().filter_map(|e| e.origin()).collect();
    for (ordinal, node) in nodes.iter().enumerate() {
        if !kept.contains(&ordinal) {
            edits.remove_element(*node);
        }
    }

    for (idx, entry) in current.iter().enumerate() {
        match entry.origin().and_then(|o| Some((nodes.get(o)?, original.get(o)?))) {
            Some((node, old)) => {
                for ((name, new), (_, previous)) in entry.fields().into_iter().zip(old.fields()) {
                    sync_field(edits, *node, name, previous, new, &order);
                }
            }
            None => {
                let anchor = current[idx + 1..]
                    .iter()
                    .find_map(|next| next.origin().and_then(|o| nodes.get(o)));
                match anchor {
                    Some(anchor) => {
                        let block = render_entry(edits, entry, &edits.indent_of(*anchor));
                        edits.insert_before(*anchor, &block);
                    }
                    None => {
                        let block = render_entry(edits, entry, &edits.child_indent(section));
                        edits.insert_last_child(section, &block);
                    }
                }
            }
        }
    }
    Vec::new()
}

/// Creates the missing tail of `path` (relative to the root) holding `entries`
fn create_section<T: SectionEntry>(
    edits: &mut EditSet,
    root: Node,
    path: &[&str],
    entries: &[&T],
    root_anchors: &[&str],
) {
    if entries.is_empty() {
        return;
    }
    let mut parent = root;
    let mut existing = 0;
    while let Some(next) = path.get(existing).and_then(|name| child(parent, name)) {
        parent = next;
        existing += 1;
    }
    if existing == path.len() {
        return;
    }

    let indent = edits.child_indent(parent);
    let block = render_nested(edits, &path[existing..], entries, &indent);
    if existing == 0 {
        insert_in_root(edits, root, &block, root_anchors);
    } else {
        edits.insert_last_child(parent, &block);
    }
}

fn insert_in_root(edits: &mut EditSet, root: Node, block: &str, anchors: &[&str]) {
    match anchors.iter().find_map(|name| child(root, name)) {
        Some(anchor) => edits.insert_before(anchor, block),
        None => edits.insert_last_child(root, block),
    }
}

fn render_entry<T: SectionEntry>(edits: &EditSet, entry: &T, indent: &str) -> String {
    let nl = edits.newline;
    let inner = format!("{indent}{}", edits.unit);
    let mut out = format!("<{}>", T::ELEMENT);
    for (name, value) in entry.fields() {
        if let Some(value) = value {
            out.push_str(&format!("{nl}{inner}<{name}>{}</{name}>", escape(value)));
        }
    }
    out.push_str(&format!("{nl}{indent}</{}>", T::ELEMENT));
    out
}

fn render_nested<T: SectionEntry>(
    edits: &EditSet,
    names: &[&str],
    entries: &[&T],
    indent: &str,
) -> String {
    let nl = edits.newline;
    match names.split_first() {
        None => entries
            .iter()
            .map(|e| render_entry(edits, *e, indent))
            .collect::<Vec<_>>()
            .join(&format!("{nl}{indent}")),
        Some((name, rest)) => {
            let inner = format!("{indent}{}", edits.unit);
            format!(
                "<{name}>{nl}{inner}{}{nl}{indent}</{name}>",
                render_nested(edits, rest, entries, &inner)
            )
        }
    }
}

/// Persists modified projects, backing up each original first
pub struct PomWriter<'a> {
    base_dir: &'a Path,
    relocate: bool,
}

impl<'a> PomWriter<'a> {
    pub fn new(base_dir: &'a Path) -> Self {
        Self {
            base_dir,
            relocate: false,
        }
    }

    /// Move repository-layout files whose coordinate changed
    pub fn relocating(mut self, relocate: bool) -> Self {
        self.relocate = relocate;
        self
    }

    /// Writes one project; returns the path written to
    pub fn write(&self, project: &Project, session: &Session) -> Result<PathBuf, RealignError> {
        let pom = project.pom();
        let text = render(project)?;
        let target = self.target_path(project);
        if text == project.original() && target == pom {
            debug!(pom = %pom.display(), "Rendered text unchanged; skipping write");
            return Ok(pom.to_path_buf());
        }

        self.backup(project, session)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| RealignError::Write {
                path: target.clone(),
                source: e,
            })?;
        }
        fs::write(&target, &text).map_err(|e| RealignError::Write {
            path: target.clone(),
            source: e,
        })?;

        if target != pom {
            info!(from = %pom.display(), to = %target.display(), "Relocated descriptor");
            if !session.options.preserve_files {
                fs::remove_file(pom).map_err(|e| RealignError::Write {
                    path: pom.to_path_buf(),
                    source: e,
                })?;
            }
        } else {
            info!(pom = %pom.display(), "Rewrote descriptor");
        }
        Ok(target)
    }

    /// Copies the pristine original under the backups directory and confirms it
    fn backup(&self, project: &Project, session: &Session) -> Result<PathBuf, RealignError> {
        let pom = project.pom();
        let relative = pom
            .strip_prefix(self.base_dir)
            .ok()
            .filter(|r| !r.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| pom.file_name().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("pom.xml"));
        let backup = session.backups_dir().join(relative);
        let failed = |source: std::io::Error| RealignError::Backup {
            path: pom.to_path_buf(),
            backup: backup.clone(),
            source,
        };

        if let Some(parent) = backup.parent() {
            fs::create_dir_all(parent).map_err(failed)?;
        }
        fs::write(&backup, project.original()).map_err(failed)?;
        let written = fs::metadata(&backup).map_err(failed)?;
        if written.len() != project.original().len() as u64 {
            return Err(failed(std::io::Error::other("backup size mismatch")));
        }
        debug!(pom = %pom.display(), backup = %backup.display(), "Backed up original");
        Ok(backup)
    }

    fn target_path(&self, project: &Project) -> PathBuf {
        let pom = project.pom().to_path_buf();
        if !self.relocate {
            return pom;
        }
        let old = project.original_key();
        let new = project.key();
        if *old == new || new.group_id.contains("${") || new.version.contains("${") {
            return pom;
        }
        let repository_name = format!("{}-{}.pom", old.artifact_id, old.version);
        if pom.file_name().and_then(|n| n.to_str()) != Some(repository_name.as_str()) {
            return pom;
        }
        self.base_dir.join(LocalRepository::relative_path(&new))
    }
}
