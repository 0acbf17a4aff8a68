//! PMR client — workspace synchronization for the modeling workbench
//!
//! Connects local workspaces to a remote Physiome Model Repository over
//! HTTP(S) and git: registers hosts, draws short-lived credentials, and
//! drives a pluggable VCS backend (native `git` binary or embedded
//! libgit2) to clone, commit, push and pull, mapping every backend- and
//! transport-specific failure into one typed error taxonomy.
//!
//! All operations are synchronous and blocking; callers own the
//! [`PmrContext`] and serialize access to it.

pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{ErrorResponse, PmrError, Result};
pub use models::{
    HostRegistration, SigningParams, TemporaryCredential, VcsOutput, WorkspaceInfo,
};
pub use services::{PmrClient, PmrContext, PmrTool, SearchKind, VcsKind};

/// Initialize tracing for embedding applications that have no subscriber
/// of their own. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pmr_client=debug,git2=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
