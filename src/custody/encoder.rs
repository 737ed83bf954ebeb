//! Payload encoding for embedding transaction bytes in a JSON request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::custody::types::{CustodyError, CustodyResult};

/// Base64 text of a serialized transaction (padded, no line wrapping).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    /// Borrow the encoded text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to the original transaction bytes.
    pub fn decode(&self) -> CustodyResult<Vec<u8>> {
        decode(&self.0)
    }

    /// Wrap text that is already base64, checking that it decodes.
    pub fn from_base64(text: &str) -> CustodyResult<Self> {
        let trimmed = text.trim();
        decode(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }
}

impl std::fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode raw transaction bytes.
pub fn encode(bytes: &[u8]) -> EncodedPayload {
    EncodedPayload(STANDARD.encode(bytes))
}

/// Decode base64 text produced by [`encode`].
pub fn decode(text: &str) -> CustodyResult<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| CustodyError::InvalidPayloadEncoding(e.to_string()))
}
