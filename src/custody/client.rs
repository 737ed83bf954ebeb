//! Custody API client for create-and-wait submissions.
//!
//! # Responsibilities
//! - Send one authenticated, signed request per submission
//! - Bound the call with the configured transport timeouts
//! - Classify failures (transport, auth, service, response shape)
//!
//! No retries happen here: re-sending a request with a stale timestamp and
//! signature is indistinguishable from a replay.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::schema::{ApiConfig, TransportConfig};
use crate::custody::envelope::RequestBody;
use crate::custody::signer::RequestSignature;
use crate::custody::types::{CustodyError, CustodyResponse, CustodyResult};

/// Header carrying the base64 request signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Header carrying the millisecond timestamp that was signed.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// HTTP client bound to one custody API base URL.
#[derive(Clone)]
pub struct CustodyClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CustodyClient {
    /// Create a client from API and transport settings.
    pub fn new(api: &ApiConfig, transport: &TransportConfig) -> CustodyResult<Self> {
        let base_url: Url = api.base_url.parse().map_err(|e| {
            CustodyError::Transport(format!("Invalid base URL '{}': {}", api.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CustodyError::Transport(format!(
                "Base URL '{}' cannot carry a path",
                api.base_url
            )));
        }

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(transport.request_timeout_secs))
            .connect_timeout(Duration::from_secs(transport.connect_timeout_secs));
        if !transport.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| CustodyError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The base URL with `endpoint_path` appended to its path.
    ///
    /// The host always comes from the base URL and any base path prefix is
    /// kept, so a gateway mounted at `/custody` receives `/custody/api/...`.
    fn endpoint_url(&self, endpoint_path: &str) -> CustodyResult<Url> {
        check_endpoint_path(endpoint_path).map_err(|reason| {
            CustodyError::Transport(format!("Invalid endpoint path '{}': {}", endpoint_path, reason))
        })?;

        let mut url = self.base_url.clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), endpoint_path);
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    /// Submit a signed request body and wait for the custody service to answer.
    ///
    /// `request_body` is sent byte-for-byte as signed.
    pub async fn submit(
        &self,
        endpoint_path: &str,
        access_token: &SecretString,
        signature: &RequestSignature,
        timestamp_millis: u64,
        request_body: &RequestBody,
    ) -> CustodyResult<CustodyResponse> {
        let url = self.endpoint_url(endpoint_path)?;

        tracing::info!(
            endpoint = %endpoint_path,
            timestamp_millis = timestamp_millis,
            "Submitting transaction to custody service"
        );

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", access_token.expose_secret()))
            .header(SIGNATURE_HEADER, signature.as_str())
            .header(TIMESTAMP_HEADER, timestamp_millis.to_string())
            .body(request_body.as_str().to_owned())
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(transport_error)?;

        classify_response(status, &text)
    }
}

impl std::fmt::Debug for CustodyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// Check that an endpoint path is a plain absolute path.
///
/// Scheme-relative (`//host/...`) and absolute URLs would move the request,
/// and with it the bearer token, to another host.
pub(crate) fn check_endpoint_path(path: &str) -> Result<(), &'static str> {
    if !path.starts_with('/') {
        return Err("must start with '/'");
    }
    if path.starts_with("//") || path.contains("://") {
        return Err("must not name a host");
    }
    if path.contains(['?', '#', '\\']) {
        return Err("must not contain '?', '#' or '\\'");
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err("must not contain '..' segments");
    }
    Ok(())
}

fn transport_error(e: reqwest::Error) -> CustodyError {
    if e.is_timeout() {
        CustodyError::Transport(format!("request timed out: {}", e))
    } else {
        CustodyError::Transport(e.to_string())
    }
}

/// Map a status and body to a custody response or a classified error.
pub(crate) fn classify_response(status: StatusCode, body: &str) -> CustodyResult<CustodyResponse> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::warn!(status = status.as_u16(), "Custody service rejected credentials");
        return Err(CustodyError::Auth {
            status: status.as_u16(),
            message: body.to_string(),
        });
    }

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Custody service returned error status");
        return Err(CustodyError::Service {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    serde_json::from_str::<CustodyResponse>(body)
        .map_err(|e| CustodyError::UnexpectedResponseShape(e.to_string()))
}
