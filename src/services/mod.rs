//! Core services for PMR workspace synchronization

pub mod api_client;
pub mod context;
pub mod session;
pub mod sync_service;
pub mod vcs;

pub use api_client::{PmrClient, SearchKind};
pub use context::PmrContext;
pub use sync_service::PmrTool;
pub use vcs::{VcsKind, WorkspaceBinding, WorkspaceVcs};
