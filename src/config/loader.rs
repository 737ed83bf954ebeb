//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use thiserror::Error;

use crate::config::schema::CustodyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `api.access_token`.
pub const ACCESS_TOKEN_ENV_VAR: &str = "CUSTODY_API_USER_TOKEN";

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config has {} problem(s): {}", .0.len(), summarize(.0))]
    Validation(Vec<ValidationError>),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Load and validate configuration from a TOML file.
///
/// A non-empty `CUSTODY_API_USER_TOKEN` replaces the file's access token.
pub fn load_config(path: &Path) -> Result<CustodyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, std::env::var(ACCESS_TOKEN_ENV_VAR).ok())
}

/// Parse and validate configuration text, applying an optional token override.
pub fn parse_config(content: &str, token_override: Option<String>) -> Result<CustodyConfig, ConfigError> {
    let mut config: CustodyConfig = toml::from_str(content)?;

    if let Some(token) = token_override.filter(|t| !t.is_empty()) {
        config.api.access_token = SecretString::from(token);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        base_url = %config.api.base_url,
        endpoint = %config.api.endpoint_path,
        vault_id = %config.vault.id,
        "Configuration loaded"
    );

    Ok(config)
}
