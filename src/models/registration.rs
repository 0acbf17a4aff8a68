//! Host registration and request-signing material
//!
//! One registration per configured PMR host. The signing material is opaque
//! to this crate; it is handed to the session factory verbatim.

use serde::{Deserialize, Serialize};

/// A configured remote PMR host and its authorization state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRegistration {
    /// Base URL of the PMR host, e.g. `https://models.physiomeproject.org`
    pub host: String,
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    /// Access token granted during registration; absent until authorized
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_secret: Option<String>,
}

impl HostRegistration {
    /// Create a registration that has not been granted access yet.
    pub fn new(host: impl Into<String>, consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: None,
            token_secret: None,
        }
    }

    /// True iff signing material is associated with this host.
    pub fn has_access(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Clear the signing material; idempotent.
    pub fn clear_token(&mut self) {
        self.token = None;
        self.token_secret = None;
    }

    /// Snapshot of the signing parameters, or `None` when access has not
    /// been granted.
    pub fn signing_params(&self) -> Option<SigningParams> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        Some(SigningParams {
            client_key: self.consumer_key.clone(),
            client_secret: self.consumer_secret.clone(),
            resource_owner_key: token.to_string(),
            resource_owner_secret: self.token_secret.clone().unwrap_or_default(),
        })
    }
}

/// Signing material handed to the session factory for one session.
///
/// Deliberately not serializable; it lives only for the call that drew it
/// from the active registration.
#[derive(Debug, Clone)]
pub struct SigningParams {
    pub client_key: String,
    pub client_secret: String,
    pub resource_owner_key: String,
    pub resource_owner_secret: String,
}
