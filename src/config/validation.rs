//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the vault id against its declared format
//! - Validate value ranges (timeouts > 0) and URL shapes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CustodyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use secrecy::ExposeSecret;

use crate::config::schema::CustodyConfig;
use crate::custody::client::check_endpoint_path;
use crate::custody::envelope::validate_vault_id;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    InvalidBaseUrl(String),
    InvalidEndpointPath { path: String, reason: &'static str },
    InvalidVaultId(String),
    ZeroTimeout(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "{} must be set", field),
            ValidationError::InvalidBaseUrl(reason) => write!(f, "api.base_url is invalid: {}", reason),
            ValidationError::InvalidEndpointPath { path, reason } => {
                write!(f, "api.endpoint_path '{}' {}", path, reason)
            }
            ValidationError::InvalidVaultId(reason) => write!(f, "vault.id is invalid: {}", reason),
            ValidationError::ZeroTimeout(field) => write!(f, "{} must be greater than zero", field),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &CustodyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.api.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidBaseUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::InvalidBaseUrl(e.to_string())),
    }

    if let Err(reason) = check_endpoint_path(&config.api.endpoint_path) {
        errors.push(ValidationError::InvalidEndpointPath {
            path: config.api.endpoint_path.clone(),
            reason,
        });
    }

    if config.api.access_token.expose_secret().is_empty() {
        errors.push(ValidationError::MissingField("api.access_token"));
    }

    if config.vault.id.is_empty() {
        errors.push(ValidationError::MissingField("vault.id"));
    } else if let Err(e) = validate_vault_id(&config.vault.id, config.vault.id_format) {
        errors.push(ValidationError::InvalidVaultId(e.to_string()));
    }

    let envelope = &config.vault.envelope;
    if envelope.transaction_type.is_empty() {
        errors.push(ValidationError::MissingField("vault.envelope.transaction_type"));
    }
    if envelope.details_type.is_empty() {
        errors.push(ValidationError::MissingField("vault.envelope.details_type"));
    }
    if envelope.chain.is_empty() {
        errors.push(ValidationError::MissingField("vault.envelope.chain"));
    }

    if config.signer.private_key_path.is_empty() {
        errors.push(ValidationError::MissingField("signer.private_key_path"));
    }

    if config.transport.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("transport.request_timeout_secs"));
    }
    if config.transport.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("transport.connect_timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
