//! Transaction intent producers.
//!
//! # Data Flow
//! ```text
//! chain-specific builder (swap, pool, transfer, ...)
//!     → IntentProducer::produce
//!     → TransactionIntent (serialized transaction bytes)
//!     → custody pipeline
//! ```
//!
//! The pipeline only ever sees bytes; no chain object model leaks past this
//! boundary.

use std::future::Future;
use std::path::PathBuf;

use crate::custody::encoder;
use crate::custody::types::CustodyError;

/// Serialized, unsigned transaction bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent(Vec<u8>);

impl TransactionIntent {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Produces serialized transaction bytes from domain parameters.
pub trait IntentProducer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn produce(&self) -> impl Future<Output = Result<TransactionIntent, Self::Error>> + Send;
}

/// Producer that hands out a transaction built elsewhere.
#[derive(Debug, Clone)]
pub struct StaticIntent(pub TransactionIntent);

impl IntentProducer for StaticIntent {
    type Error = std::convert::Infallible;

    async fn produce(&self) -> Result<TransactionIntent, Self::Error> {
        Ok(self.0.clone())
    }
}

/// How a transaction file is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    /// Raw serialized bytes.
    Raw,
    /// Base64 text, as printed by most chain SDKs.
    Base64,
}

/// Errors reading a transaction file.
#[derive(Debug, thiserror::Error)]
pub enum FileIntentError {
    #[error("cannot read transaction file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transaction file {path} is not valid base64: {source}")]
    Encoding {
        path: String,
        #[source]
        source: CustodyError,
    },
}

/// Producer that reads a serialized transaction from a file.
#[derive(Debug, Clone)]
pub struct FileIntent {
    pub path: PathBuf,
    pub encoding: FileEncoding,
}

impl FileIntent {
    pub fn new(path: impl Into<PathBuf>, encoding: FileEncoding) -> Self {
        Self {
            path: path.into(),
            encoding,
        }
    }
}

impl IntentProducer for FileIntent {
    type Error = FileIntentError;

    async fn produce(&self) -> Result<TransactionIntent, Self::Error> {
        let path = self.path.display().to_string();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FileIntentError::Io { path: path.clone(), source })?;

        let bytes = match self.encoding {
            FileEncoding::Raw => bytes,
            FileEncoding::Base64 => {
                let text = String::from_utf8_lossy(&bytes);
                encoder::decode(text.trim()).map_err(|source| FileIntentError::Encoding { path, source })?
            }
        };

        Ok(TransactionIntent(bytes))
    }
}
