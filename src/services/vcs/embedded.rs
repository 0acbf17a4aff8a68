//! Backend driving libgit2 in process
//!
//! Mirrors the native backend's contract: operation failures surface as a
//! structured [`VcsOutput`] with a non-zero status and the libgit2 message
//! on stderr, matching what the external `git` binary would report.

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Cred, CredentialType, FetchOptions, PushOptions, RemoteCallbacks, Repository, Signature};
use std::path::Path;

use crate::error::{PmrError, Result};
use crate::models::VcsOutput;
use crate::services::vcs::{decode_basic_auth, WorkspaceBinding, WorkspaceVcs};

/// Committer identity used when the repository has none configured.
const FALLBACK_SIGNATURE: (&str, &str) = ("PMR Workspace Sync", "pmr@localhost");

pub struct EmbeddedGit {
    authorization: Option<String>,
}

impl EmbeddedGit {
    pub fn new() -> Self {
        Self {
            authorization: None,
        }
    }

    /// Remote callbacks that answer user-pass challenges with the
    /// credential recovered from the Basic authorization header.
    fn callbacks(&self) -> RemoteCallbacks<'static> {
        let credential = self.authorization.as_deref().and_then(decode_basic_auth);
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, _username_from_url, allowed_types| {
            tracing::debug!("credential callback for {url}");
            if let Some((user, key)) = &credential {
                if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                    return Cred::userpass_plaintext(user, key);
                }
            }
            Err(git2::Error::from_str(
                "no credential available for the requested authentication type",
            ))
        });
        callbacks
    }

    fn signature(repo: &Repository) -> std::result::Result<Signature<'static>, git2::Error> {
        repo.signature()
            .or_else(|_| Signature::now(FALLBACK_SIGNATURE.0, FALLBACK_SIGNATURE.1))
    }

    fn clone_inner(
        &self,
        remote_url: &str,
        local_dir: &Path,
    ) -> std::result::Result<String, git2::Error> {
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(self.callbacks());
        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(remote_url, local_dir)?;
        Ok(format!(
            "cloned {} into {}",
            remote_url,
            local_dir.display()
        ))
    }

    fn commit_inner(
        &self,
        binding: &WorkspaceBinding,
        message: &str,
    ) -> std::result::Result<String, git2::Error> {
        let repo = Repository::open(binding.local_dir())?;
        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let signature = Self::signature(&repo)?;

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.as_ref().into_iter().collect();

        let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        let short = oid.to_string();
        Ok(format!("[{}] {}", &short[..7], message))
    }

    fn push_inner(&self, binding: &WorkspaceBinding) -> std::result::Result<String, git2::Error> {
        let repo = Repository::open(binding.local_dir())?;
        let mut remote = repo.find_remote("origin")?;

        let head = repo.head()?;
        let branch = head.shorthand().unwrap_or("master").to_string();
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(self.callbacks());
        remote.push(&[&refspec], Some(&mut push_options))?;

        Ok(format!(
            "pushed {} to {}",
            branch,
            remote.url().unwrap_or("origin")
        ))
    }

    fn pull_inner(&self, binding: &WorkspaceBinding) -> std::result::Result<String, git2::Error> {
        let repo = Repository::open(binding.local_dir())?;
        let mut remote = repo.find_remote("origin")?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(self.callbacks());
        remote.fetch(&[] as &[&str], Some(&mut fetch_options), None)?;

        let head = repo.head()?;
        let branch = head.shorthand().unwrap_or("master").to_string();
        let fetch_ref = repo.find_reference(&format!("refs/remotes/origin/{branch}"))?;
        let fetch_commit = repo.reference_to_annotated_commit(&fetch_ref)?;

        let (analysis, _preference) = repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            return Ok("already up to date".to_string());
        }

        if analysis.is_fast_forward() {
            let refname = format!("refs/heads/{branch}");
            let mut reference = repo.find_reference(&refname)?;
            reference.set_target(fetch_commit.id(), "fast-forward")?;
            repo.set_head(&refname)?;
            repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
            return Ok(format!("fast-forwarded {branch}"));
        }

        repo.merge(&[&fetch_commit], None, None)?;
        if repo.index()?.has_conflicts() {
            return Err(git2::Error::from_str(
                "pull produced merge conflicts; resolve them locally and commit",
            ));
        }

        let signature = Self::signature(&repo)?;
        let head_commit = repo.head()?.peel_to_commit()?;
        let remote_commit = repo.find_commit(fetch_commit.id())?;
        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &format!("Merge origin/{branch} into {branch}"),
            &tree,
            &[&head_commit, &remote_commit],
        )?;
        repo.cleanup_state()?;

        Ok(format!("merged origin/{branch} into {branch}"))
    }
}

impl Default for EmbeddedGit {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold a libgit2 outcome into the structured result contract shared with
/// the native backend.
fn into_output(result: std::result::Result<String, git2::Error>) -> VcsOutput {
    match result {
        Ok(stdout) => VcsOutput {
            stdout,
            stderr: String::new(),
            status: 0,
        },
        Err(err) => VcsOutput {
            stdout: String::new(),
            stderr: err.message().to_string(),
            status: 1,
        },
    }
}

impl WorkspaceVcs for EmbeddedGit {
    fn bind(&self, local_dir: &Path) -> Result<WorkspaceBinding> {
        if Repository::open(local_dir).is_err() {
            std::fs::create_dir_all(local_dir)?;
            Repository::init(local_dir)?;
        }
        Ok(WorkspaceBinding::new(local_dir))
    }

    fn clone_from(&self, remote_url: &str, local_dir: &Path) -> Result<VcsOutput> {
        Ok(into_output(self.clone_inner(remote_url, local_dir)))
    }

    fn set_authorization(&mut self, header: String) {
        self.authorization = Some(header);
    }

    fn write_remote(&self, binding: &WorkspaceBinding) -> Result<()> {
        let remote_url = binding.remote_url().ok_or_else(|| {
            PmrError::unexpected("no remote URL associated with the workspace binding")
        })?;
        let repo = Repository::open(binding.local_dir())?;
        if repo.find_remote("origin").is_ok() {
            repo.remote_set_url("origin", remote_url)?;
        } else {
            repo.remote("origin", remote_url)?;
        }
        Ok(())
    }

    fn add(&self, binding: &WorkspaceBinding, filename: &str) -> Result<()> {
        let repo = Repository::open(binding.local_dir())?;
        let mut index = repo.index()?;
        index.add_path(Path::new(filename))?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, binding: &WorkspaceBinding, message: &str) -> Result<VcsOutput> {
        Ok(into_output(self.commit_inner(binding, message)))
    }

    fn push(&self, binding: &WorkspaceBinding) -> Result<VcsOutput> {
        Ok(into_output(self.push_inner(binding)))
    }

    fn pull(&self, binding: &WorkspaceBinding) -> Result<VcsOutput> {
        Ok(into_output(self.pull_inner(binding)))
    }
}
