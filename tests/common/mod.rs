//! Shared utilities for custody integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use secrecy::SecretString;
use tokio::net::TcpListener;

use custody_submit::config::CustodyConfig;
use custody_submit::custody::KeySource;
use custody_submit::CustodyPipeline;

pub const ENDPOINT: &str = "/api/v1/transactions/create-and-wait";
pub const TOKEN: &str = "test-access-token";
pub const TEST_KEY_PEM: &str = include_str!("../fixtures/api_signer.pem");
#[allow(dead_code)]
pub const OTHER_KEY_PEM: &str = include_str!("../fixtures/other_signer.pem");

/// A request as seen by the stub custody service.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub signature: Option<String>,
    pub timestamp: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// What the stub answers once authentication passes.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    #[allow(dead_code)]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

struct StubState {
    verifying_key: VerifyingKey,
    reply: Reply,
    requests: Mutex<Vec<CapturedRequest>>,
}

/// Handle to a running stub custody service.
pub struct StubCustody {
    pub addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubCustody {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

pub fn verifying_key(pem: &str) -> VerifyingKey {
    *SigningKey::from_pkcs8_pem(pem).unwrap().verifying_key()
}

fn signature_valid(key: &VerifyingKey, request: &CapturedRequest) -> bool {
    let (Some(signature), Some(timestamp)) = (&request.signature, &request.timestamp) else {
        return false;
    };
    let Ok(der) = STANDARD.decode(signature) else {
        return false;
    };
    let Ok(signature) = Signature::from_der(&der) else {
        return false;
    };
    let payload = format!("{}|{}|{}", ENDPOINT, timestamp, request.body);
    key.verify(payload.as_bytes(), &signature).is_ok()
}

async fn create_and_wait(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let request = CapturedRequest {
        authorization: header("authorization"),
        signature: header("x-signature"),
        timestamp: header("x-timestamp"),
        content_type: header("content-type"),
        body,
    };
    state.requests.lock().unwrap().push(request.clone());

    let expected = format!("Bearer {}", TOKEN);
    if request.authorization.as_deref() != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, r#"{"title":"Invalid access token"}"#.into());
    }
    if !signature_valid(&state.verifying_key, &request) {
        return (StatusCode::UNAUTHORIZED, r#"{"title":"Invalid request signature"}"#.into());
    }

    if let Some(delay) = state.reply.delay {
        tokio::time::sleep(delay).await;
    }
    let status = StatusCode::from_u16(state.reply.status).unwrap();
    (status, state.reply.body.clone())
}

/// Start a stub custody service on an ephemeral port.
///
/// It checks the bearer token and verifies signatures against the test key.
pub async fn start_stub_custody(reply: Reply) -> StubCustody {
    let state = Arc::new(StubState {
        verifying_key: verifying_key(TEST_KEY_PEM),
        reply,
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route(ENDPOINT, post(create_and_wait))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    StubCustody { addr, state }
}

/// Configuration pointing at `base_url` with the test token.
pub fn test_config(base_url: &str, vault_id: &str) -> CustodyConfig {
    let mut config = CustodyConfig::default();
    config.api.base_url = base_url.to_string();
    config.api.access_token = SecretString::from(TOKEN.to_string());
    config.vault.id = vault_id.to_string();
    config.transport.use_system_proxy = false;
    config.transport.request_timeout_secs = 5;
    config.transport.connect_timeout_secs = 2;
    config
}

/// Pipeline signing with the in-memory test key.
pub fn test_pipeline(base_url: &str, vault_id: &str) -> CustodyPipeline {
    CustodyPipeline::from_config(test_config(base_url, vault_id))
        .unwrap()
        .with_key_source(KeySource::pem(TEST_KEY_PEM))
}

/// An address nothing listens on.
#[allow(dead_code)]
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
