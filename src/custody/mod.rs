//! Custody submission subsystem.
//!
//! # Data Flow
//! ```text
//! TransactionIntent (bytes)
//!     → encoder.rs (base64)
//!     → envelope.rs (vault id check, canonical JSON body)
//!     → signer.rs (path|timestamp|body, ECDSA P-256 / SHA-256, base64)
//!     → client.rs (POST create-and-wait with bearer token, signature, timestamp)
//!     → validator.rs (first returned signature or MissingSignature)
//! ```
//!
//! # Security Constraints
//! - The API signer key is acquired per signature and dropped immediately
//! - Never log access tokens or key material
//! - No automatic retries; a retry needs a new timestamp and signature

pub mod client;
pub mod encoder;
pub mod envelope;
pub mod pipeline;
pub mod signer;
pub mod types;
pub mod validator;

pub use client::CustodyClient;
pub use encoder::EncodedPayload;
pub use envelope::{EnvelopeBuilder, RequestBody};
pub use pipeline::CustodyPipeline;
pub use signer::{KeySource, RequestSignature, RequestSigner, SigningContext};
pub use types::{CustodyError, CustodyResponse, CustodyResult, ReturnedSignature, SubmissionReceipt};
