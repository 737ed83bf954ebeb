//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env override)
//!     → validation.rs (semantic checks)
//!     → CustodyConfig (validated, immutable)
//!     → passed explicitly to the pipeline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The access token can come from the environment instead of the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ACCESS_TOKEN_ENV_VAR};
pub use schema::CustodyConfig;
pub use schema::{ApiConfig, EnvelopeProfile, SignerConfig, TransportConfig, VaultConfig, VaultIdFormat};
