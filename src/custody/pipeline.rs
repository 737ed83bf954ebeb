//! End-to-end custody submission.
//!
//! # Responsibilities
//! - Encode, wrap, sign, submit and validate one transaction intent
//! - Stamp every attempt with a fresh timestamp and signature
//! - Record the outcome of every attempt
//!
//! Validation and key loading happen before any network activity, so a bad
//! vault id or unreadable key never reaches the custody service.

use std::time::Instant;

use secrecy::SecretString;

use crate::config::schema::CustodyConfig;
use crate::custody::client::CustodyClient;
use crate::custody::encoder;
use crate::custody::envelope::{EnvelopeBuilder, RequestBody};
use crate::custody::signer::{KeySource, RequestSigner, SigningContext};
use crate::custody::types::{CustodyError, CustodyResult, SubmissionReceipt};
use crate::custody::validator;
use crate::intent::{IntentProducer, TransactionIntent};
use crate::observability::metrics;

/// Composed submission flow for one vault.
///
/// Holds no per-request state; concurrent submissions through `&self` each
/// build their own signing context.
#[derive(Debug)]
pub struct CustodyPipeline {
    endpoint_path: String,
    access_token: SecretString,
    vault_id: String,
    envelope: EnvelopeBuilder,
    signer: RequestSigner,
    client: CustodyClient,
}

impl CustodyPipeline {
    /// Build a pipeline from a validated configuration.
    pub fn from_config(config: CustodyConfig) -> CustodyResult<Self> {
        let client = CustodyClient::new(&config.api, &config.transport)?;
        let envelope = EnvelopeBuilder::new(config.vault.envelope, config.vault.id_format)
            .with_note(config.vault.note);
        let signer = RequestSigner::new(KeySource::file(config.signer.private_key_path));

        tracing::info!(
            base_url = %client.base_url(),
            endpoint = %config.api.endpoint_path,
            vault_id = %config.vault.id,
            "Custody pipeline initialized"
        );

        Ok(Self {
            endpoint_path: config.api.endpoint_path,
            access_token: config.api.access_token,
            vault_id: config.vault.id,
            envelope,
            signer,
            client,
        })
    }

    /// Replace the configured key file with another key source.
    pub fn with_key_source(mut self, key: KeySource) -> Self {
        self.signer = RequestSigner::new(key);
        self
    }

    /// The vault transactions are submitted for.
    pub fn vault_id(&self) -> &str {
        &self.vault_id
    }

    /// Encode an intent and build its request body without signing or sending.
    pub fn prepare(&self, intent: &TransactionIntent) -> CustodyResult<RequestBody> {
        if intent.is_empty() {
            return Err(CustodyError::EmptyIntent);
        }
        let payload = encoder::encode(intent.as_bytes());
        self.envelope.build(&self.vault_id, &payload)
    }

    /// Run a producer and submit what it yields.
    pub async fn submit_from<P>(&self, producer: &P) -> CustodyResult<SubmissionReceipt>
    where
        P: IntentProducer + Sync,
    {
        let intent = producer
            .produce()
            .await
            .map_err(|e| CustodyError::IntentProducer(Box::new(e)))?;
        self.submit_intent(intent).await
    }

    /// Submit one transaction intent and wait for the custody signature.
    pub async fn submit_intent(&self, intent: TransactionIntent) -> CustodyResult<SubmissionReceipt> {
        let start = Instant::now();
        let result = self.run(&intent).await;

        match &result {
            Ok(receipt) => {
                metrics::record_submission(metrics::OUTCOME_SIGNED, start);
                tracing::info!(
                    vault_id = %self.vault_id,
                    transaction_id = ?receipt.transaction_id,
                    state = ?receipt.state,
                    "Transaction completed"
                );
            }
            Err(e) => {
                metrics::record_submission(e.kind(), start);
                tracing::warn!(
                    vault_id = %self.vault_id,
                    error = %e,
                    kind = e.kind(),
                    "Custody submission failed"
                );
            }
        }

        result
    }

    async fn run(&self, intent: &TransactionIntent) -> CustodyResult<SubmissionReceipt> {
        let body = self.prepare(intent)?;

        let context = SigningContext::now(&self.endpoint_path, body.as_str())?;
        let signature = self.signer.sign(&context)?;

        let response = self
            .client
            .submit(
                &self.endpoint_path,
                &self.access_token,
                &signature,
                context.timestamp_millis,
                &body,
            )
            .await?;

        let transaction_id = response.id.clone();
        let state = response.state.clone();
        let signature = validator::validate(response)?;

        Ok(SubmissionReceipt {
            signature,
            transaction_id,
            state,
            timestamp_millis: context.timestamp_millis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(vault_id: &str) -> CustodyPipeline {
        let mut config = CustodyConfig::default();
        config.vault.id = vault_id.to_string();
        config.api.access_token = SecretString::from("token".to_string());
        CustodyPipeline::from_config(config).unwrap()
    }

    #[test]
    fn test_prepare_builds_body() {
        let body = pipeline("abc").prepare(&TransactionIntent::new(b"A".to_vec())).unwrap();
        assert!(body.as_str().contains(r#""vault_id":"abc""#));
        assert!(body.as_str().contains(r#""data":"QQ==""#));
    }

    #[test]
    fn test_prepare_rejects_empty_intent() {
        let result = pipeline("abc").prepare(&TransactionIntent::new(Vec::new()));
        assert!(matches!(result, Err(CustodyError::EmptyIntent)));
    }

    #[tokio::test]
    async fn test_invalid_vault_fails_before_signing() {
        // The default key path does not exist; InvalidVaultId must win over KeyLoad.
        let result = pipeline("").submit_intent(TransactionIntent::new(vec![1u8; 10])).await;
        assert!(matches!(result, Err(CustodyError::InvalidVaultId { .. })));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        // Default base URL is never contacted: the key load fails first.
        let pipeline = pipeline("abc").with_key_source(KeySource::file("/nonexistent/private.pem"));
        let result = pipeline.submit_intent(TransactionIntent::new(vec![1u8; 10])).await;
        assert!(matches!(result, Err(CustodyError::KeyLoad(_))));
    }
}
