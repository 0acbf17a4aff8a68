//! Test utilities for creating temporary git repositories

#![cfg(test)]

use std::path::PathBuf;
use tempfile::TempDir;

/// A temporary git repository for testing
pub struct TestRepo {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestRepo {
    /// Create a new empty git repository
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().to_path_buf();

        let repo = git2::Repository::init(&path).expect("Failed to init repo");

        // Configure user for commits
        let mut config = repo.config().expect("Failed to get config");
        config
            .set_str("user.name", "Test User")
            .expect("Failed to set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Failed to set user.email");

        Self { dir, path }
    }

    /// Create a repository with an initial commit
    pub fn with_initial_commit() -> Self {
        let test_repo = Self::new();
        test_repo.create_commit("Initial commit", &[("README.md", "# Workspace")]);
        test_repo
    }

    /// Create a bare repository usable as a local push/pull remote
    pub fn new_bare() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().to_path_buf();
        git2::Repository::init_bare(&path).expect("Failed to init bare repo");
        Self { dir, path }
    }

    /// Get the git2 repository
    pub fn repo(&self) -> git2::Repository {
        git2::Repository::open(&self.path).expect("Failed to open repo")
    }

    /// Create a file with content
    pub fn create_file(&self, name: &str, content: &str) {
        let file_path = self.path.join(name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Stage a file
    pub fn stage_file(&self, name: &str) {
        let repo = self.repo();
        let mut index = repo.index().expect("Failed to get index");
        index
            .add_path(std::path::Path::new(name))
            .expect("Failed to stage file");
        index.write().expect("Failed to write index");
    }

    /// Create a commit with the given files
    pub fn create_commit(&self, message: &str, files: &[(&str, &str)]) -> git2::Oid {
        let repo = self.repo();

        for (name, content) in files {
            self.create_file(name, content);
            self.stage_file(name);
        }

        let mut index = repo.index().expect("Failed to get index");
        let tree_oid = index.write_tree().expect("Failed to write tree");
        let tree = repo.find_tree(tree_oid).expect("Failed to find tree");
        let sig = repo.signature().expect("Failed to get signature");

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.as_ref().into_iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Add a remote
    pub fn add_remote(&self, name: &str, url: &str) {
        let repo = self.repo();
        repo.remote(name, url).expect("Failed to add remote");
    }

    /// Get the HEAD commit OID
    pub fn head_oid(&self) -> git2::Oid {
        let repo = self.repo();
        let head = repo.head().expect("Failed to get HEAD");
        head.target().expect("Failed to get target")
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
