//! Custody response types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export the envelope settings from the config module to avoid duplication
pub use crate::config::schema::{EnvelopeProfile, VaultIdFormat};

/// Errors that can occur while preparing or submitting a custody request.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// Vault identifier is empty or not in the expected format.
    #[error("Invalid vault id '{vault_id}': {reason}")]
    InvalidVaultId { vault_id: String, reason: String },

    /// The transaction intent producer returned no bytes.
    #[error("Transaction intent is empty")]
    EmptyIntent,

    /// The transaction intent producer failed.
    #[error("Transaction intent producer failed: {0}")]
    IntentProducer(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Encoded payload text is not valid base64.
    #[error("Invalid payload encoding: {0}")]
    InvalidPayloadEncoding(String),

    /// Envelope could not be serialized.
    #[error("Envelope serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API signer key is missing or malformed.
    #[error("Key load error: {0}")]
    KeyLoad(String),

    /// The signing primitive failed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Network failure or transport timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The custody service rejected the credentials or the request signature.
    #[error("Authentication rejected with status {status}: {message}")]
    Auth { status: u16, message: String },

    /// The custody service answered with a non-auth error status.
    #[error("Custody service returned status {status}: {body}")]
    Service { status: u16, body: String },

    /// A 2xx response whose body is not a custody response.
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponseShape(String),

    /// The custody service did not return a completed signature.
    #[error("Signature not returned by custody service")]
    MissingSignature,
}

impl CustodyError {
    /// Whether the caller may re-attempt with a freshly timestamped and signed request.
    ///
    /// The pipeline never retries on its own; this only classifies the failure.
    pub fn is_retryable_with_new_signature(&self) -> bool {
        match self {
            CustodyError::Transport(_) | CustodyError::MissingSignature => true,
            CustodyError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CustodyError::InvalidVaultId { .. } => "invalid_vault_id",
            CustodyError::EmptyIntent => "empty_intent",
            CustodyError::IntentProducer(_) => "intent_producer",
            CustodyError::InvalidPayloadEncoding(_) => "invalid_payload_encoding",
            CustodyError::Serialization(_) => "serialization",
            CustodyError::KeyLoad(_) => "key_load",
            CustodyError::Signing(_) => "signing",
            CustodyError::Transport(_) => "transport",
            CustodyError::Auth { .. } => "auth",
            CustodyError::Service { .. } => "service",
            CustodyError::UnexpectedResponseShape(_) => "unexpected_response_shape",
            CustodyError::MissingSignature => "missing_signature",
        }
    }
}

/// Result type for custody operations.
pub type CustodyResult<T> = Result<T, CustodyError>;

/// One signature record returned by the custody service.
///
/// The record layout belongs to the provider, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnedSignature(pub serde_json::Value);

impl ReturnedSignature {
    /// The `data` field of the record, when it is a string.
    pub fn data(&self) -> Option<&str> {
        self.0.get("data").and_then(|v| v.as_str())
    }

    /// True when the record carries nothing: `null`, `false`, `""`, `[]` or `{}`.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null | serde_json::Value::Bool(false) => true,
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(fields) => fields.is_empty(),
            _ => false,
        }
    }
}

/// Body of a create-and-wait response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustodyResponse {
    /// Custody-side transaction identifier.
    #[serde(default)]
    pub id: Option<String>,

    /// Custody-side transaction state (e.g. "completed", "waiting_for_approval").
    #[serde(default)]
    pub state: Option<String>,

    /// Signatures produced within the wait window. Absent or empty means incomplete.
    #[serde(default)]
    pub signatures: Option<Vec<ReturnedSignature>>,
}

/// Terminal artifact of one successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    /// First signature returned by the custody service.
    pub signature: ReturnedSignature,
    /// Custody-side transaction identifier, if reported.
    pub transaction_id: Option<String>,
    /// Custody-side transaction state, if reported.
    pub state: Option<String>,
    /// Timestamp the request was signed with.
    pub timestamp_millis: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserialize_full() {
        let json = r#"{"id":"tx-1","state":"completed","signatures":[{"data":"c2ln"}]}"#;
        let response: CustodyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.id.as_deref(), Some("tx-1"));
        assert_eq!(response.state.as_deref(), Some("completed"));
        let signatures = response.signatures.unwrap();
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0].data(), Some("c2ln"));
    }

    #[test]
    fn test_response_without_signatures() {
        let response: CustodyResponse = serde_json::from_str(r#"{"state":"pending"}"#).unwrap();
        assert!(response.signatures.is_none());

        let response: CustodyResponse = serde_json::from_str(r#"{"signatures":null}"#).unwrap();
        assert!(response.signatures.is_none());
    }

    #[test]
    fn test_response_rejects_non_array_signatures() {
        let result = serde_json::from_str::<CustodyResponse>(r#"{"signatures":"nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_retry_classification() {
        assert!(CustodyError::Transport("reset".into()).is_retryable_with_new_signature());
        assert!(CustodyError::MissingSignature.is_retryable_with_new_signature());
        assert!(CustodyError::Service { status: 503, body: String::new() }
            .is_retryable_with_new_signature());
        assert!(!CustodyError::Service { status: 400, body: String::new() }
            .is_retryable_with_new_signature());
        assert!(!CustodyError::Auth { status: 401, message: String::new() }
            .is_retryable_with_new_signature());
        assert!(!CustodyError::KeyLoad("missing".into()).is_retryable_with_new_signature());
    }

    #[test]
    fn test_error_display() {
        let err = CustodyError::Auth { status: 401, message: "bad token".into() };
        assert_eq!(err.to_string(), "Authentication rejected with status 401: bad token");

        let err = CustodyError::MissingSignature;
        assert_eq!(err.kind(), "missing_signature");
    }
}
