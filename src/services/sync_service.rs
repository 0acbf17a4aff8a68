//! Workspace synchronization orchestrator
//!
//! Glues the credential context, the remote API client and a VCS backend
//! together. Every sync operation follows the same shape: resolve the local
//! directory's remote URL, draw a fresh temporary credential for it, bind
//! an authenticated backend and execute. A missing remote or ungranted
//! access short-circuits quietly; only credential acquisition failures
//! escalate as errors.

use serde_json::Value;
use std::path::Path;
use url::Url;

use crate::error::{PmrError, Result};
use crate::models::{TemporaryCredential, VcsOutput, WorkspaceInfo};
use crate::services::api_client::{PmrClient, SearchKind};
use crate::services::context::PmrContext;
use crate::services::vcs::{basic_auth_header, resolve_workspace_url, VcsKind, WorkspaceVcs};

/// The synchronous facade exposed to the workbench GUI.
pub struct PmrTool {
    context: PmrContext,
    vcs_kind: VcsKind,
}

impl PmrTool {
    /// Backend selection is fixed at construction; reconstruct the tool to
    /// switch backends.
    pub fn new(context: PmrContext, use_external_git: bool) -> Self {
        let vcs_kind = if use_external_git {
            VcsKind::NativeGit
        } else {
            VcsKind::Embedded
        };
        Self { context, vcs_kind }
    }

    pub fn vcs_kind(&self) -> VcsKind {
        self.vcs_kind
    }

    pub fn context(&self) -> &PmrContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PmrContext {
        &mut self.context
    }

    pub fn has_access(&self) -> bool {
        self.context.has_access()
    }

    pub fn is_active(&self) -> bool {
        self.context.is_active()
    }

    pub fn deregister(&mut self) {
        self.context.deregister();
    }

    fn client(&self) -> PmrClient<'_> {
        PmrClient::new(&self.context)
    }

    // ------------------------------------------------------------------
    // Remote API passthroughs
    // ------------------------------------------------------------------

    pub fn search(&self, text: &str, kind: SearchKind) -> Result<Value> {
        self.client().search(text, kind)
    }

    pub fn get_object_info(&self, target_url: &str) -> Result<WorkspaceInfo> {
        self.client().object_info(target_url)
    }

    pub fn get_dashboard(&self) -> Result<Value> {
        self.client().dashboard()
    }

    pub fn is_valid_host(&self, host: &str) -> Result<bool> {
        self.client().is_valid_host(host)
    }

    pub fn add_workspace(&self, title: &str, description: &str) -> Result<Option<String>> {
        self.client().add_workspace(title, description, "git")
    }

    pub fn request_temporary_password(
        &self,
        workspace_url: &str,
    ) -> Result<Option<TemporaryCredential>> {
        self.client().request_temporary_password(workspace_url)
    }

    pub fn add_file_to_indexer(
        &self,
        local_workspace_dir: &Path,
        workspace_file: &str,
    ) -> Result<Option<Value>> {
        self.client()
            .add_file_to_indexer(local_workspace_dir, workspace_file)
    }

    // ------------------------------------------------------------------
    // Workspace synchronization
    // ------------------------------------------------------------------

    /// Backend instance carrying a fresh temporary credential for
    /// `remote_url`, or an unauthenticated one when access has not been
    /// granted.
    fn bind_backend(&self, remote_url: &str) -> Result<Box<dyn WorkspaceVcs>> {
        let mut backend = self.vcs_kind.backend();
        if let Some(credential) = self.client().request_temporary_password(remote_url)? {
            backend.set_authorization(basic_auth_header(&credential.user, &credential.key));
        }
        Ok(backend)
    }

    /// Clone a remote workspace into `local_workspace_dir`.
    pub fn clone_workspace(
        &self,
        remote_workspace_url: &str,
        local_workspace_dir: &Path,
    ) -> Result<VcsOutput> {
        let backend = self.bind_backend(remote_workspace_url)?;
        let output = backend.clone_from(remote_workspace_url, local_workspace_dir)?;
        self.report(&output);
        Ok(output)
    }

    /// Stage `files` and record one commit.
    ///
    /// Returns `None` without raising when the directory has no underlying
    /// repository to commit into.
    pub fn commit_files(
        &self,
        local_workspace_dir: &Path,
        message: &str,
        files: &[&str],
    ) -> Result<Option<VcsOutput>> {
        let Some(remote_url) = resolve_workspace_url(local_workspace_dir) else {
            tracing::info!("skipping commit, no underlying repo detected");
            return Ok(None);
        };

        tracing::info!("using {:?} backend for committing files", self.vcs_kind);
        let backend = self.bind_backend(&remote_url)?;
        let binding = backend.bind(local_workspace_dir)?;

        for file in files {
            backend.add(&binding, file)?;
        }

        let output = backend.commit(&binding, message)?;
        self.report(&output);
        Ok(Some(output))
    }

    /// Push local history to the workspace's remote.
    ///
    /// Skips quietly when no remote is configured or access has not been
    /// granted; pushing always requires a credential.
    pub fn push_to_remote(
        &self,
        local_workspace_dir: &Path,
    ) -> Result<Option<(String, String)>> {
        let Some(remote_url) = resolve_workspace_url(local_workspace_dir) else {
            tracing::info!("skipping push, no remote workspace configured");
            return Ok(None);
        };
        let Some(credential) = self.client().request_temporary_password(&remote_url)? else {
            tracing::info!("skipping push, no access to the remote workspace");
            return Ok(None);
        };

        let mut backend = self.vcs_kind.backend();
        backend.set_authorization(basic_auth_header(&credential.user, &credential.key));
        let binding = backend.bind(local_workspace_dir)?;
        let output = backend.push(&binding)?;
        Ok(Some(self.report(&output)))
    }

    /// Pull remote history into the local workspace. Public workspaces
    /// pull anonymously; a credential is attached when available.
    pub fn pull_from_remote(
        &self,
        local_workspace_dir: &Path,
    ) -> Result<Option<(String, String)>> {
        let Some(remote_url) = resolve_workspace_url(local_workspace_dir) else {
            tracing::info!("skipping pull, no remote workspace configured");
            return Ok(None);
        };

        let backend = self.bind_backend(&remote_url)?;
        let binding = backend.bind(local_workspace_dir)?;
        let output = backend.pull(&binding)?;
        Ok(Some(self.report(&output)))
    }

    /// True iff the directory is under version control and its remote
    /// points at one of the registered PMR hosts (scheme, host and port
    /// comparison, not full URL equality).
    pub fn is_pmr_workflow(&self, local_workspace_dir: &Path) -> bool {
        if !local_workspace_dir.join(".git").is_dir() {
            return false;
        }
        let Some(remote_url) = resolve_workspace_url(local_workspace_dir) else {
            return false;
        };
        let Ok(remote) = Url::parse(&remote_url) else {
            return false;
        };
        self.context.hosts().iter().any(|host| {
            Url::parse(host)
                .map(|host| same_netloc(&host, &remote))
                .unwrap_or(false)
        })
    }

    /// Link a directory not yet under PMR control to an existing remote
    /// workspace: verify the remote's storage kind, initialize a local
    /// binding and write the remote association.
    pub fn link_workspace_dir_to_url(
        &self,
        local_workspace_dir: &Path,
        remote_workspace_url: &str,
    ) -> Result<()> {
        let workspace = self.client().object_info(remote_workspace_url)?;
        if !self.vcs_kind.supports_storage(&workspace.storage) {
            return Err(PmrError::UnsupportedStorage {
                storage: workspace.storage,
            });
        }

        let backend = self.vcs_kind.backend();
        let binding = backend
            .bind(local_workspace_dir)?
            .with_remote(remote_workspace_url);
        backend.write_remote(&binding)
    }

    /// Log a backend result: stdout always as info, stderr as error only
    /// when the operation reported a non-zero status.
    fn report(&self, output: &VcsOutput) -> (String, String) {
        if !output.stdout.is_empty() {
            tracing::info!("{}", output.stdout);
        }
        if !output.stderr.is_empty() {
            if output.success() {
                tracing::info!("{}", output.stderr);
            } else {
                tracing::error!("{}", output.stderr);
            }
        }
        (output.stdout.clone(), output.stderr.clone())
    }
}

fn same_netloc(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
