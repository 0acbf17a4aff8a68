//! Outbound HTTP sessions carrying the fixed PMR protocol headers
//!
//! Sessions are ephemeral: one per logical API call. Automatic redirect
//! following is disabled on the underlying client because the signature
//! attached to a request is not valid for a transport-followed redirect;
//! callers resolve `Location` headers explicitly.

use rand::Rng;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::models::SigningParams;
use crate::services::context::PmrContext;

/// Media type the PMR service dispatches on; part of the wire protocol.
pub const PROTOCOL: &str = "application/vnd.physiome.pmr2.json.0";

/// Fixed user-agent string identifying this client.
pub const USER_AGENT_STRING: &str = "pmr.jsonclient.Client/0.2";

/// A request session: plain when anonymous, request-signing when the
/// context has been granted access.
pub struct Session {
    client: Client,
    signing: Option<SigningParams>,
}

impl Session {
    /// Session for the given context; signed iff the context has access.
    pub fn for_context(context: &PmrContext) -> Result<Self> {
        Self::build(context.session_params())
    }

    /// Plain session regardless of any stored credentials.
    pub fn anonymous() -> Result<Self> {
        Self::build(None)
    }

    fn build(signing: Option<SigningParams>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(PROTOCOL));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(PROTOCOL));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));

        let client = Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, signing })
    }

    pub fn is_signed(&self) -> bool {
        self.signing.is_some()
    }

    /// Issue a GET; redirects are returned to the caller, never followed.
    pub fn get(&self, url: &str) -> Result<Response> {
        Ok(self.sign(self.client.get(url)).send()?)
    }

    /// Issue a POST with a preassembled body; redirects are returned to the
    /// caller, never followed.
    pub fn post(&self, url: &str, body: String) -> Result<Response> {
        Ok(self.sign(self.client.post(url).body(body)).send()?)
    }

    fn sign(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.signing {
            Some(params) => request.header(AUTHORIZATION, authorization_header(params)),
            None => request,
        }
    }
}

/// OAuth 1.0a Authorization header using the PLAINTEXT signature method.
/// The secrets pass through opaquely; no key material is derived here.
fn authorization_header(params: &SigningParams) -> String {
    let nonce: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let signature = format!(
        "{}&{}",
        urlencoding::encode(&params.client_secret),
        urlencoding::encode(&params.resource_owner_secret),
    );

    format!(
        "OAuth oauth_version=\"1.0\", oauth_signature_method=\"PLAINTEXT\", \
         oauth_consumer_key=\"{}\", oauth_token=\"{}\", oauth_timestamp=\"{}\", \
         oauth_nonce=\"{}\", oauth_signature=\"{}\"",
        urlencoding::encode(&params.client_key),
        urlencoding::encode(&params.resource_owner_key),
        timestamp,
        nonce,
        urlencoding::encode(&signature),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HostRegistration;

    fn params() -> SigningParams {
        SigningParams {
            client_key: "consumer key".to_string(),
            client_secret: "c&s".to_string(),
            resource_owner_key: "tok".to_string(),
            resource_owner_secret: "t s".to_string(),
        }
    }

    #[test]
    fn test_authorization_header_shape() {
        let header = authorization_header(&params());
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_signature_method=\"PLAINTEXT\""));
        assert!(header.contains("oauth_consumer_key=\"consumer%20key\""));
        assert!(header.contains("oauth_token=\"tok\""));
        // secrets are percent-encoded before being joined with '&'
        assert!(header.contains("oauth_signature=\"c%2526s%26t%2520s\""));
    }

    #[test]
    fn test_session_signed_only_with_access() {
        let mut ctx = PmrContext::new();
        ctx.register(HostRegistration::new("https://models.example.org", "ck", "cs"));
        assert!(!Session::for_context(&ctx).unwrap().is_signed());

        ctx.update_token(Some("tok".to_string()), Some("sec".to_string()));
        assert!(Session::for_context(&ctx).unwrap().is_signed());
        assert!(!Session::anonymous().unwrap().is_signed());
    }
}
