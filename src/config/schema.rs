//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for custody
//! submissions. All types derive Serde traits for deserialization from config files.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Default custody API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.fordefi.com";

/// Default create-and-wait endpoint.
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/v1/transactions/create-and-wait";

/// Root configuration for the custody submission pipeline.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CustodyConfig {
    /// Custody API endpoint and credentials.
    pub api: ApiConfig,

    /// Target vault and envelope settings.
    pub vault: VaultConfig,

    /// API signer key location.
    pub signer: SignerConfig,

    /// HTTP transport settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Custody API settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the custody API (e.g., "https://api.fordefi.com").
    pub base_url: String,

    /// Endpoint path that is both requested and signed.
    pub endpoint_path: String,

    /// Bearer token of the API user. Never logged.
    pub access_token: SecretString,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            access_token: SecretString::from(String::new()),
        }
    }
}

/// Accepted shapes of a vault identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultIdFormat {
    /// RFC 4122 UUID text.
    Uuid,
    /// `0x`-prefixed hex address.
    Address,
    /// Opaque token of ASCII alphanumerics, `-` and `_`.
    #[default]
    Any,
}

/// Chain-specific constant fields of the request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvelopeProfile {
    /// Top-level transaction type.
    pub transaction_type: String,

    /// Type of the `details` object.
    pub details_type: String,

    /// Target chain identifier.
    pub chain: String,
}

impl Default for EnvelopeProfile {
    fn default() -> Self {
        Self {
            transaction_type: "sui_transaction".to_string(),
            details_type: "sui_serialized_transaction".to_string(),
            chain: "sui_mainnet".to_string(),
        }
    }
}

/// Target vault configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault identifier at the custody service.
    pub id: String,

    /// Expected format of `id`.
    pub id_format: VaultIdFormat,

    /// Optional note attached to every transaction.
    pub note: Option<String>,

    /// Envelope fields for the vault's chain.
    pub envelope: EnvelopeProfile,
}

/// API signer key configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Path to the PEM-encoded P-256 private key.
    pub private_key_path: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key_path: "./fordefi_secret/private.pem".to_string(),
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Total time for one create-and-wait call in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Honor HTTP(S)_PROXY environment variables.
    pub use_system_proxy: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            use_system_proxy: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = CustodyConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.endpoint_path, DEFAULT_ENDPOINT_PATH);
        assert!(config.api.access_token.expose_secret().is_empty());
        assert_eq!(config.vault.id_format, VaultIdFormat::Any);
        assert_eq!(config.vault.envelope.chain, "sui_mainnet");
        assert_eq!(config.transport.request_timeout_secs, 120);
    }

    #[test]
    fn test_partial_toml() {
        let config: CustodyConfig = toml::from_str(
            r#"
            [api]
            access_token = "tok"

            [vault]
            id = "0bbd4f4b-dcb0-47f0-a1a9-4a09614cd8c2"
            id_format = "uuid"

            [vault.envelope]
            chain = "sui_testnet"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.access_token.expose_secret(), "tok");
        assert_eq!(config.api.endpoint_path, DEFAULT_ENDPOINT_PATH);
        assert_eq!(config.vault.id_format, VaultIdFormat::Uuid);
        assert_eq!(config.vault.envelope.chain, "sui_testnet");
        assert_eq!(config.vault.envelope.details_type, "sui_serialized_transaction");
    }

    #[test]
    fn test_token_not_in_debug_output() {
        let config: CustodyConfig = toml::from_str("[api]\naccess_token = \"super-secret\"").unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
