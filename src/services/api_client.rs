//! Remote API client for a PMR server
//!
//! Issues the fixed set of remote operations over an ephemeral session and
//! normalizes transport, status and parsing failures into [`PmrError`].
//! Nothing below this boundary leaks an untranslated low-level error.

use reqwest::blocking::Response;
use reqwest::header::LOCATION;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

use crate::error::{PmrError, Result};
use crate::models::{TemporaryCredential, WorkspaceInfo};
use crate::services::context::PmrContext;
use crate::services::session::Session;
use crate::services::vcs::resolve_workspace_url;

const DASHBOARD_ENDPOINT: &str = "pmr2-dashboard";
const SEARCH_ENDPOINT: &str = "search";
const RICORDO_ENDPOINT: &str = "pmr2_ricordo/query";
const MAP_ENDPOINT: &str = "map_query";
const TEMPORARY_PASSWORD_ENDPOINT: &str = "request_temporary_password";
const RDF_INDEXER_ENDPOINT: &str = "rdf_indexer";

/// The closed set of search kinds the workbench offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchKind {
    OntologicalTerm,
    PlainText,
    Workflow,
}

/// Form-submission envelope the PMR service expects for POSTed actions.
fn form_request(action: &str, fields: Value) -> String {
    json!({
        "fields": fields,
        "actions": { action: 1 },
    })
    .to_string()
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Endpoint and body for one search request; kept separate from the
/// transport so the dispatch is testable without a server.
fn search_request(host: &str, text: &str, kind: SearchKind) -> (String, String) {
    match kind {
        SearchKind::OntologicalTerm => (
            join_url(host, RICORDO_ENDPOINT),
            form_request("search", json!({ "simple_query": text })),
        ),
        SearchKind::Workflow => (
            join_url(host, MAP_ENDPOINT),
            form_request(
                "search",
                json!({
                    "workflow_object": "Workflow Project",
                    "ontological_term": text,
                }),
            ),
        ),
        SearchKind::PlainText => (
            join_url(host, SEARCH_ENDPOINT),
            json!({ "SearchableText": text, "portal_type": "Workspace" }).to_string(),
        ),
    }
}

/// Client for the remote PMR API, borrowing the caller's credential context.
pub struct PmrClient<'a> {
    context: &'a PmrContext,
}

impl<'a> PmrClient<'a> {
    pub fn new(context: &'a PmrContext) -> Self {
        Self { context }
    }

    fn host(&self) -> Result<&str> {
        self.context
            .host()
            .ok_or_else(|| PmrError::unexpected("no PMR host is currently active"))
    }

    fn permission_message(&self) -> String {
        if self.context.has_access() {
            "Access credentials are no longer valid.  Please deregister and \
             register the application to renew access and try again."
                .to_string()
        } else {
            "The configured PMR server may have disallowed this action.".to_string()
        }
    }

    /// Translate a response into decoded JSON per the error taxonomy:
    /// 403 becomes a permission error, any redirect is refused, any other
    /// non-success status becomes `service_message`, and an undecodable
    /// body is an unexpected-response error.
    fn into_json(&self, response: Response, service_message: &str) -> Result<Value> {
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(PmrError::Permission {
                message: self.permission_message(),
            });
        }
        if status.is_redirection() {
            return Err(PmrError::UnexpectedResponse {
                message: "The server redirected a request that cannot be re-signed; \
                          refusing to follow."
                    .to_string(),
            });
        }
        if !status.is_success() {
            return Err(PmrError::WebService {
                message: service_message.to_string(),
            });
        }
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|_| PmrError::UnexpectedResponse {
            message: "The server returned an unexpected response and the client \
                      is unable to proceed."
                .to_string(),
        })
    }

    /// Search PMR for `text` using one of the three search kinds.
    pub fn search(&self, text: &str, kind: SearchKind) -> Result<Value> {
        let session = Session::for_context(self.context)?;
        let (target, body) = search_request(self.host()?, text, kind);
        let response = session.post(&target, body)?;
        self.into_json(
            response,
            "The PMR search service may be misconfigured and/or is unavailable \
             at this moment.  Please check configuration settings and try again.",
        )
    }

    /// Fetch the raw object metadata JSON at `target_url`.
    pub fn object_info_value(&self, target_url: &str) -> Result<Value> {
        let session = Session::for_context(self.context)?;
        let response = session.get(target_url)?;
        self.into_json(
            response,
            "Server responded with an error message and the client is unable \
             to continue the action.",
        )
    }

    /// Fetch and decode workspace metadata at `target_url`.
    pub fn object_info(&self, target_url: &str) -> Result<WorkspaceInfo> {
        let value = self.object_info_value(target_url)?;
        serde_json::from_value(value).map_err(|_| PmrError::UnexpectedResponse {
            message: "The server returned an unexpected response that the client \
                      cannot process."
                .to_string(),
        })
    }

    /// Fetch the dashboard of the active host.
    pub fn dashboard(&self) -> Result<Value> {
        let session = Session::for_context(self.context)?;
        let response = session.get(&join_url(self.host()?, DASHBOARD_ENDPOINT))?;
        self.into_json(
            response,
            "The PMR dashboard is unavailable at this moment.  Please check \
             configuration settings and try again.",
        )
    }

    /// Probe `host` anonymously; a valid PMR host advertises both the
    /// workspace-home and workspace-add capabilities on its dashboard.
    pub fn is_valid_host(&self, host: &str) -> Result<bool> {
        let session = Session::anonymous()?;
        let response = session.get(&join_url(host, DASHBOARD_ENDPOINT))?;
        let dashboard = self.into_json(
            response,
            "The host did not respond as a PMR server.  Please check the \
             address and try again.",
        )?;
        Ok(dashboard.get("workspace-home").is_some() && dashboard.get("workspace-add").is_some())
    }

    /// Request a fresh short-lived credential scoped to `workspace_url`.
    ///
    /// Returns `None` without touching the network when access has not been
    /// granted; this is a normal state, not an error.
    pub fn request_temporary_password(
        &self,
        workspace_url: &str,
    ) -> Result<Option<TemporaryCredential>> {
        if !self.context.has_access() {
            return Ok(None);
        }
        let session = Session::for_context(self.context)?;
        let response = session.post(
            &join_url(workspace_url, TEMPORARY_PASSWORD_ENDPOINT),
            "{}".to_string(),
        )?;
        let value = self.into_json(
            response,
            "The PMR server could not issue a temporary password for the \
             workspace.  Please try again later.",
        )?;
        let credential = serde_json::from_value(value).map_err(|_| PmrError::UnexpectedResponse {
            message: "The server's temporary password response could not be \
                      processed."
                .to_string(),
        })?;
        Ok(Some(credential))
    }

    /// Create a workspace on the active host and return its URL.
    ///
    /// The dashboard's advertised creation target is one redirect short of
    /// the real form target, so this walks exactly two `Location` hops with
    /// automatic redirects disabled: advertised target -> real POST target,
    /// POST -> new workspace. Returns `None` when the dashboard does not
    /// advertise workspace creation.
    pub fn add_workspace(
        &self,
        title: &str,
        description: &str,
        storage: &str,
    ) -> Result<Option<String>> {
        let session = Session::for_context(self.context)?;
        let dashboard = self.dashboard()?;
        let target = dashboard
            .get("workspace-add")
            .and_then(|option| option.get("target"))
            .and_then(Value::as_str);
        let Some(target) = target else {
            return Ok(None);
        };

        let response = session.get(target)?;
        let target = location_header(&response)?;

        let response = session.post(
            &target,
            form_request(
                "add",
                json!({
                    "title": title,
                    "description": description,
                    "storage": storage,
                }),
            ),
        )?;
        let workspace_url = location_header(&response)?;

        // verify the workspace exists by fetching it
        let response = session.get(&workspace_url)?;
        let value = self.into_json(
            response,
            "The workspace was created but the PMR server did not return it.",
        )?;
        Ok(value.get("url").and_then(Value::as_str).map(str::to_string))
    }

    /// Submit `workspace_file` in the directory's remote workspace to the
    /// RDF indexer for ontological searching. No-op when access has not
    /// been granted or the directory has no remote.
    pub fn add_file_to_indexer(
        &self,
        local_workspace_dir: &Path,
        workspace_file: &str,
    ) -> Result<Option<Value>> {
        if !self.context.has_access() {
            return Ok(None);
        }
        let Some(remote_url) = resolve_workspace_url(local_workspace_dir) else {
            return Ok(None);
        };
        let session = Session::for_context(self.context)?;
        let response = session.post(
            &join_url(&remote_url, RDF_INDEXER_ENDPOINT),
            form_request("export_rdf", json!({ "paths": [workspace_file] })),
        )?;
        self.into_json(
            response,
            "The PMR indexer did not accept the file.  Please try again later.",
        )
        .map(Some)
    }
}

fn location_header(response: &Response) -> Result<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| PmrError::UnexpectedResponse {
            message: "The server did not provide a redirect target where one \
                      was expected."
                .to_string(),
        })
}
