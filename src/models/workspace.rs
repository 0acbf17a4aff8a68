//! Workspace data exchanged with a PMR server

use serde::{Deserialize, Serialize};

/// Short-lived credential issued by the remote for one sync cycle.
///
/// Deserialized from the wire and dropped when the operation completes.
/// There is intentionally no `Serialize` implementation: a temporary
/// credential must never be persisted or reused across operations.
#[derive(Debug, Clone, Deserialize)]
pub struct TemporaryCredential {
    pub user: String,
    pub key: String,
}

/// Remote workspace object metadata as exposed by PMR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    /// Storage backend the remote workspace was created with, e.g. `git`
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub url: String,
}

/// Structured result of one VCS backend operation
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcsOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl VcsOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}
