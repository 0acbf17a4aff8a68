//! Pluggable version-control backends for workspace synchronization
//!
//! Two interchangeable implementations sit behind [`WorkspaceVcs`]: one
//! spawning the native `git` binary and one driving libgit2 in process.
//! Backend failures during an operation are data ([`VcsOutput`] with a
//! non-zero status), not raised errors; the orchestrator decides how to
//! surface them.

pub mod embedded;
pub mod native;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::VcsOutput;

/// Which backend a client instance drives; immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    /// External `git` process
    NativeGit,
    /// Embedded libgit2
    Embedded,
}

impl VcsKind {
    /// Construct a fresh backend instance of this kind.
    pub fn backend(self) -> Box<dyn WorkspaceVcs> {
        match self {
            VcsKind::NativeGit => Box::new(native::NativeGit::new()),
            VcsKind::Embedded => Box::new(embedded::EmbeddedGit::new()),
        }
    }

    /// Whether this backend can drive a remote workspace of the given
    /// storage kind.
    pub fn supports_storage(self, storage: &str) -> bool {
        storage == "git"
    }
}

/// A local directory paired with the backend driving it for one operation.
#[derive(Debug, Clone)]
pub struct WorkspaceBinding {
    local_dir: PathBuf,
    remote_url: Option<String>,
}

impl WorkspaceBinding {
    pub fn new(local_dir: &Path) -> Self {
        Self {
            local_dir: local_dir.to_path_buf(),
            remote_url: resolve_workspace_url(local_dir),
        }
    }

    /// Associate a remote URL, for bindings created ahead of the remote
    /// being written.
    pub fn with_remote(mut self, remote_url: &str) -> Self {
        self.remote_url = Some(remote_url.to_string());
        self
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }
}

/// Capability interface every VCS backend implements.
pub trait WorkspaceVcs {
    /// Associate a local directory with this backend, initializing version
    /// control metadata when none exists.
    fn bind(&self, local_dir: &Path) -> Result<WorkspaceBinding>;

    /// Clone `remote_url` into `local_dir`.
    fn clone_from(&self, remote_url: &str, local_dir: &Path) -> Result<VcsOutput>;

    /// Attach a precomputed HTTP Basic authentication header used by all
    /// subsequent network operations of this instance.
    fn set_authorization(&mut self, header: String);

    /// Register the binding's remote URL against the local directory.
    fn write_remote(&self, binding: &WorkspaceBinding) -> Result<()>;

    /// Stage a file.
    fn add(&self, binding: &WorkspaceBinding, filename: &str) -> Result<()>;

    fn commit(&self, binding: &WorkspaceBinding, message: &str) -> Result<VcsOutput>;

    fn push(&self, binding: &WorkspaceBinding) -> Result<VcsOutput>;

    fn pull(&self, binding: &WorkspaceBinding) -> Result<VcsOutput>;
}

/// Remote URL configured for the directory's `origin`, or `None` when the
/// directory is not under version control or has no remote. Never errors;
/// an unbound directory is a normal state.
pub fn resolve_workspace_url(local_dir: &Path) -> Option<String> {
    let repo = git2::Repository::open(local_dir).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(str::to_string)
}

/// `"Basic " + base64(user:key)` header for the temporary credential.
pub fn basic_auth_header(user: &str, key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{key}")))
}

/// Recover the user and key from a Basic authentication header.
pub(crate) fn decode_basic_auth(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, key) = text.split_once(':')?;
    Some((user.to_string(), key.to_string()))
}
