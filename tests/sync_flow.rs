//! End-to-end workspace synchronization flows against local repositories
//!
//! These tests drive the public facade with real git repositories on disk
//! (local bare directories standing in for the remote workspace) and never
//! touch the network: a context that was never granted access draws no
//! temporary password, so every backend operation runs anonymously.

use std::path::Path;

use pmr_client::services::vcs::{VcsKind, WorkspaceVcs};
use pmr_client::{HostRegistration, PmrContext, PmrTool};
use tempfile::TempDir;

fn tool_without_access(host: &str) -> PmrTool {
    let mut context = PmrContext::new();
    context.register(HostRegistration::new(host, "consumer", "consumer-secret"));
    PmrTool::new(context, false)
}

/// Initialize a repository with a committer identity configured
fn init_repo(path: &Path) -> git2::Repository {
    let repo = git2::Repository::init(path).expect("Failed to init repo");
    let mut config = repo.config().expect("Failed to get config");
    config
        .set_str("user.name", "Test User")
        .expect("Failed to set user.name");
    config
        .set_str("user.email", "test@example.com")
        .expect("Failed to set user.email");
    repo
}

/// Stage one file and commit it
fn commit_file(path: &Path, name: &str, content: &str, message: &str) -> git2::Oid {
    let repo = git2::Repository::open(path).expect("Failed to open repo");
    std::fs::write(path.join(name), content).expect("Failed to write file");

    let mut index = repo.index().expect("Failed to get index");
    index
        .add_path(Path::new(name))
        .expect("Failed to stage file");
    index.write().expect("Failed to write index");

    let tree_oid = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_oid).expect("Failed to find tree");
    let sig = repo.signature().expect("Failed to get signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.as_ref().into_iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to create commit")
}

/// A bare repository seeded with one commit, usable as a local remote
fn seeded_bare_remote() -> (TempDir, TempDir) {
    let bare = TempDir::new().expect("Failed to create temp dir");
    git2::Repository::init_bare(bare.path()).expect("Failed to init bare repo");

    let source = TempDir::new().expect("Failed to create temp dir");
    let repo = init_repo(source.path());
    commit_file(source.path(), "README.md", "# Workspace", "Initial commit");
    repo.remote("origin", bare.path().to_str().unwrap())
        .expect("Failed to add remote");

    let backend = VcsKind::Embedded.backend();
    let binding = backend.bind(source.path()).unwrap();
    let pushed = backend.push(&binding).unwrap();
    assert!(pushed.success(), "seed push failed: {}", pushed.stderr);

    (bare, source)
}

#[test]
fn test_commit_files_records_a_commit() {
    let workspace = TempDir::new().unwrap();
    let repo = init_repo(workspace.path());
    commit_file(workspace.path(), "README.md", "# Workspace", "Initial commit");
    repo.remote("origin", "https://models.example.org/workspace/1")
        .unwrap();

    std::fs::write(workspace.path().join("data.csv"), "1,2,3\n").unwrap();

    let tool = tool_without_access("https://models.example.org");
    let output = tool
        .commit_files(workspace.path(), "Add experiment data", &["data.csv"])
        .unwrap()
        .expect("repository with a remote must not short-circuit");
    assert!(output.success(), "stderr: {}", output.stderr);

    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.message().unwrap().trim(), "Add experiment data");
}

#[test]
fn test_commit_files_without_repo_short_circuits() {
    let workspace = TempDir::new().unwrap();
    let tool = tool_without_access("https://models.example.org");
    let result = tool
        .commit_files(workspace.path(), "message", &["file.txt"])
        .unwrap();
    assert!(result.is_none());
    assert!(!workspace.path().join(".git").exists());
}

#[test]
fn test_clone_then_pull_tracks_remote_history() {
    let (bare, source) = seeded_bare_remote();
    let tool = tool_without_access("https://models.example.org");

    let destination = TempDir::new().unwrap();
    let workspace_dir = destination.path().join("workspace");
    let output = tool
        .clone_workspace(bare.path().to_str().unwrap(), &workspace_dir)
        .unwrap();
    assert!(output.success(), "stderr: {}", output.stderr);
    assert!(workspace_dir.join(".git").is_dir());
    assert!(workspace_dir.join("README.md").exists());

    // remote history moves on
    commit_file(source.path(), "model.cellml", "<model/>", "Add model");
    let backend = VcsKind::Embedded.backend();
    let binding = backend.bind(source.path()).unwrap();
    assert!(backend.push(&binding).unwrap().success());

    let (stdout, stderr) = tool
        .pull_from_remote(&workspace_dir)
        .unwrap()
        .expect("cloned workspace has a remote configured");
    assert!(stderr.is_empty(), "pull reported: {stderr}");
    assert!(!stdout.is_empty());
    assert!(workspace_dir.join("model.cellml").exists());
}

#[test]
fn test_pull_without_remote_short_circuits() {
    let workspace = TempDir::new().unwrap();
    init_repo(workspace.path());
    let tool = tool_without_access("https://models.example.org");
    assert!(tool.pull_from_remote(workspace.path()).unwrap().is_none());
}

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[test]
fn test_native_backend_stages_and_commits() {
    if !git_available() {
        eprintln!("git binary not available, skipping");
        return;
    }

    let workspace = TempDir::new().unwrap();
    init_repo(workspace.path());
    std::fs::write(workspace.path().join("sim.json"), "{}").unwrap();

    let backend = VcsKind::NativeGit.backend();
    let binding = backend.bind(workspace.path()).unwrap();
    backend.add(&binding, "sim.json").unwrap();
    let output = backend.commit(&binding, "Add simulation settings").unwrap();
    assert!(output.success(), "stderr: {}", output.stderr);

    let repo = git2::Repository::open(workspace.path()).unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.message().unwrap().trim(), "Add simulation settings");
}

#[test]
fn test_native_backend_binds_fresh_directory() {
    if !git_available() {
        eprintln!("git binary not available, skipping");
        return;
    }

    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("fresh");
    let backend = VcsKind::NativeGit.backend();
    let binding = backend.bind(&workspace).unwrap();
    assert!(workspace.join(".git").is_dir());
    assert!(binding.remote_url().is_none());
}
