//! Shared helpers for the integration suites

use pomalign::RealignConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to get the path to the pomalign binary
#[allow(dead_code)]
pub fn pomalign_bin() -> PathBuf {
    // In tests, the binary should be at target/debug/pomalign
    let mut path = env::current_exe()
        .expect("Failed to get current executable path")
        .parent()
        .expect("No parent")
        .to_path_buf();

    // If we're in deps/, go up one more level
    if path.ends_with("deps") {
        path = path.parent().expect("No parent").to_path_buf();
    }

    path.join("pomalign")
}

#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[allow(dead_code)]
pub fn catalog(name: &str) -> String {
    fixture_path("catalogs").join(name).display().to_string()
}

/// Recursively copies a fixture tree so tests can rewrite it freely
#[allow(dead_code)]
pub fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("Failed to create destination");
    for entry in fs::read_dir(from).expect("Failed to read fixture directory") {
        let entry = entry.expect("Failed to read entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("Failed to copy fixture file");
        }
    }
}

/// A scratch copy of a fixture tree with its own workspace and empty local repository
#[allow(dead_code)]
pub struct Scratch {
    pub dir: TempDir,
    pub tree: PathBuf,
    pub workspace: PathBuf,
    pub repo: PathBuf,
}

#[allow(dead_code)]
impl Scratch {
    pub fn from_fixture(name: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let tree = dir.path().join("tree");
        copy_tree(&fixture_path(name), &tree);
        Self::with_tree(dir, tree)
    }

    pub fn empty() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let tree = dir.path().join("tree");
        fs::create_dir_all(&tree).expect("Failed to create tree");
        Self::with_tree(dir, tree)
    }

    fn with_tree(dir: TempDir, tree: PathBuf) -> Self {
        let workspace = dir.path().join("work");
        let repo = dir.path().join("repo");
        fs::create_dir_all(&repo).expect("Failed to create repo");
        Self {
            dir,
            tree,
            workspace,
            repo,
        }
    }

    pub fn config(&self, boms: &[String]) -> RealignConfig {
        let mut config = RealignConfig::new(&self.tree);
        config.boms = boms.to_vec();
        config.workspace = self.workspace.clone();
        config.local_repository = Some(self.repo.clone());
        config
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.tree.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.tree.join(relative)).expect("Failed to read file")
    }
}
