//! Credential context for the configured PMR hosts
//!
//! An explicit, caller-owned object rather than process-wide state so that
//! each tool instance (and each test) carries its own registration.

use crate::models::{HostRegistration, SigningParams};

/// Holds the active host registration plus every host the workbench knows
/// about. Mutated only through the register/deregister operations; never
/// touches the network.
#[derive(Debug, Clone, Default)]
pub struct PmrContext {
    active: Option<HostRegistration>,
    hosts: Vec<String>,
}

impl PmrContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `registration` the active host, remembering its URL.
    pub fn register(&mut self, registration: HostRegistration) {
        if !self.hosts.contains(&registration.host) {
            self.hosts.push(registration.host.clone());
        }
        self.active = Some(registration);
    }

    /// Record an additional known host without activating it.
    pub fn add_host(&mut self, host: impl Into<String>) {
        let host = host.into();
        if !self.hosts.contains(&host) {
            self.hosts.push(host);
        }
    }

    /// Replace the token material on the active registration.
    pub fn update_token(&mut self, token: Option<String>, secret: Option<String>) {
        if let Some(active) = &mut self.active {
            active.token = token;
            active.token_secret = secret;
        }
    }

    /// Clear signing material unconditionally; idempotent.
    pub fn deregister(&mut self) {
        self.update_token(None, None);
    }

    /// True iff a signing key is associated with the active host.
    pub fn has_access(&self) -> bool {
        self.active.as_ref().is_some_and(|r| r.has_access())
    }

    /// True iff a host is currently selected.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn host(&self) -> Option<&str> {
        self.active.as_ref().map(|r| r.host.as_str())
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Signing parameters for a new session, or `None` for anonymous.
    pub fn session_params(&self) -> Option<SigningParams> {
        self.active.as_ref().and_then(|r| r.signing_params())
    }
}
