//! Request envelope construction.
//!
//! # Responsibilities
//! - Validate the target vault identifier
//! - Wrap the encoded transaction into the provider's request body
//! - Serialize exactly once into the text that is both signed and sent
//!
//! # Design Decisions
//! - Field order is fixed by struct declaration order, so equal inputs always
//!   serialize to equal bytes
//! - The serialized text is carried as [`RequestBody`] and never re-encoded

use serde::Serialize;

use crate::custody::encoder::EncodedPayload;
use crate::custody::types::{CustodyError, CustodyResult, EnvelopeProfile, VaultIdFormat};

/// Signer type expected by the custody service for API-signed requests.
pub const SIGNER_TYPE: &str = "api_signer";

/// Let the custody service pick the signing flow.
pub const SIGN_MODE: &str = "auto";

/// Longest opaque vault identifier accepted by [`VaultIdFormat::Any`].
pub const MAX_VAULT_ID_LEN: usize = 128;

/// Canonical JSON text of a request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody(String);

impl RequestBody {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize)]
struct RequestEnvelope<'a> {
    vault_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    signer_type: &'a str,
    sign_mode: &'a str,
    #[serde(rename = "type")]
    transaction_type: &'a str,
    details: TransactionDetails<'a>,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    #[serde(rename = "type")]
    details_type: &'a str,
    chain: &'a str,
    data: &'a str,
}

/// Builds request bodies for one envelope profile.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeBuilder {
    profile: EnvelopeProfile,
    id_format: VaultIdFormat,
    note: Option<String>,
}

impl EnvelopeBuilder {
    /// Create a builder for the given profile and vault-id format.
    pub fn new(profile: EnvelopeProfile, id_format: VaultIdFormat) -> Self {
        Self {
            profile,
            id_format,
            note: None,
        }
    }

    /// Attach a note to every envelope built by this builder.
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.is_empty());
        self
    }

    /// Build the canonical request body.
    pub fn build(&self, vault_id: &str, payload: &EncodedPayload) -> CustodyResult<RequestBody> {
        validate_vault_id(vault_id, self.id_format)?;

        let envelope = RequestEnvelope {
            vault_id,
            note: self.note.as_deref(),
            signer_type: SIGNER_TYPE,
            sign_mode: SIGN_MODE,
            transaction_type: &self.profile.transaction_type,
            details: TransactionDetails {
                details_type: &self.profile.details_type,
                chain: &self.profile.chain,
                data: payload.as_str(),
            },
        };

        let text = serde_json::to_string(&envelope)?;

        tracing::debug!(
            vault_id = %vault_id,
            chain = %self.profile.chain,
            body_len = text.len(),
            "Request envelope built"
        );

        Ok(RequestBody(text))
    }
}

/// Build a request body with the default profile and an opaque vault-id format.
pub fn build(vault_id: &str, payload: &EncodedPayload) -> CustodyResult<RequestBody> {
    EnvelopeBuilder::default().build(vault_id, payload)
}

/// Check a vault identifier against the expected format.
pub fn validate_vault_id(vault_id: &str, format: VaultIdFormat) -> CustodyResult<()> {
    let invalid = |reason: &str| CustodyError::InvalidVaultId {
        vault_id: vault_id.to_string(),
        reason: reason.to_string(),
    };

    if vault_id.is_empty() {
        return Err(invalid("vault id is empty"));
    }

    match format {
        VaultIdFormat::Uuid => {
            uuid::Uuid::parse_str(vault_id).map_err(|e| invalid(&e.to_string()))?;
        }
        VaultIdFormat::Address => {
            let hex = vault_id
                .strip_prefix("0x")
                .ok_or_else(|| invalid("address must start with 0x"))?;
            if hex.is_empty() || hex.len() > 64 {
                return Err(invalid("address must have 1 to 64 hex digits"));
            }
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid("address contains non-hex characters"));
            }
        }
        VaultIdFormat::Any => {
            if vault_id.len() > MAX_VAULT_ID_LEN {
                return Err(invalid("vault id is too long"));
            }
            if !vault_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(invalid("vault id contains unsupported characters"));
            }
        }
    }

    Ok(())
}
