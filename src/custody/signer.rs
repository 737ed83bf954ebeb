//! Request signing with the API signer key.
//!
//! # Security
//! - The key is loaded per signing call and dropped when the call returns
//! - PEM text is held in zeroizing storage; the parsed key zeroizes on drop
//! - Key material is never logged or serialized

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use zeroize::Zeroizing;

use crate::custody::types::{CustodyError, CustodyResult};

const SEC1_PEM_LABEL: &str = "BEGIN EC PRIVATE KEY";

/// Where the API signer private key lives.
#[derive(Clone)]
pub enum KeySource {
    /// PEM file on disk, read on every signing call.
    File(PathBuf),
    /// PEM text already held by the caller.
    Pem(Zeroizing<String>),
}

impl KeySource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        KeySource::File(path.into())
    }

    pub fn pem(text: impl Into<String>) -> Self {
        KeySource::Pem(Zeroizing::new(text.into()))
    }

    /// Run `f` with the parsed key; the key does not outlive the call.
    pub fn with_key<T>(&self, f: impl FnOnce(&SigningKey) -> CustodyResult<T>) -> CustodyResult<T> {
        let key = match self {
            KeySource::File(path) => {
                let pem = std::fs::read_to_string(path).map(Zeroizing::new).map_err(|e| {
                    CustodyError::KeyLoad(format!("cannot read key file {}: {}", path.display(), e))
                })?;
                parse_signing_key(&pem)?
            }
            KeySource::Pem(pem) => parse_signing_key(pem)?,
        };
        f(&key)
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::File(path) => f.debug_tuple("File").field(path).finish(),
            KeySource::Pem(_) => f.write_str("Pem([REDACTED])"),
        }
    }
}

/// Parse a P-256 private key from PKCS#8 or SEC1 PEM text.
pub(crate) fn parse_signing_key(pem: &str) -> CustodyResult<SigningKey> {
    if pem.contains(SEC1_PEM_LABEL) {
        p256::SecretKey::from_sec1_pem(pem)
            .map(SigningKey::from)
            .map_err(|e| CustodyError::KeyLoad(format!("invalid SEC1 private key: {}", e)))
    } else {
        SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| CustodyError::KeyLoad(format!("invalid PKCS#8 private key: {}", e)))
    }
}

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn current_timestamp_millis() -> CustodyResult<u64> {
    timestamp_millis_at(SystemTime::now())
}

/// A clock reading before the epoch is a `Signing` error, never timestamp 0.
fn timestamp_millis_at(time: SystemTime) -> CustodyResult<u64> {
    let elapsed = time.duration_since(UNIX_EPOCH).map_err(|e| {
        tracing::warn!(behind_ms = e.duration().as_millis() as u64, "System clock is before the Unix epoch");
        CustodyError::Signing(format!("system clock is before the Unix epoch by {:?}", e.duration()))
    })?;
    u64::try_from(elapsed.as_millis())
        .map_err(|_| CustodyError::Signing("system clock is out of range".into()))
}

/// The values a request signature covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningContext<'a> {
    pub endpoint_path: &'a str,
    pub timestamp_millis: u64,
    pub request_body: &'a str,
}

impl<'a> SigningContext<'a> {
    pub fn new(endpoint_path: &'a str, timestamp_millis: u64, request_body: &'a str) -> Self {
        Self {
            endpoint_path,
            timestamp_millis,
            request_body,
        }
    }

    /// Context stamped with the current wall-clock time.
    pub fn now(endpoint_path: &'a str, request_body: &'a str) -> CustodyResult<Self> {
        Ok(Self::new(endpoint_path, current_timestamp_millis()?, request_body))
    }

    /// The exact string that gets signed: `path|timestamp|body`.
    pub fn payload(&self) -> String {
        format!(
            "{}|{}|{}",
            self.endpoint_path, self.timestamp_millis, self.request_body
        )
    }
}

/// Base64 of a DER-encoded ECDSA P-256 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignature(String);

impl RequestSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signs request contexts with a scoped API signer key.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    key: KeySource,
}

impl RequestSigner {
    pub fn new(key: KeySource) -> Self {
        Self { key }
    }

    /// Sign a context. ECDSA nonces are derived per RFC 6979, so equal
    /// inputs under one key give equal signatures.
    pub fn sign(&self, context: &SigningContext<'_>) -> CustodyResult<RequestSignature> {
        let payload = context.payload();
        let signature = self.key.with_key(|key| {
            let signature: Signature = key
                .try_sign(payload.as_bytes())
                .map_err(|e| CustodyError::Signing(e.to_string()))?;
            Ok(signature)
        })?;

        tracing::debug!(
            endpoint = %context.endpoint_path,
            timestamp_millis = context.timestamp_millis,
            "Request signed by API signer"
        );

        Ok(RequestSignature(STANDARD.encode(signature.to_der().as_bytes())))
    }
}

/// Sign `endpoint_path|timestamp_millis|request_body` with the given key.
pub fn sign(
    endpoint_path: &str,
    timestamp_millis: u64,
    request_body: &str,
    key: &KeySource,
) -> CustodyResult<RequestSignature> {
    RequestSigner::new(key.clone()).sign(&SigningContext::new(endpoint_path, timestamp_millis, request_body))
}
