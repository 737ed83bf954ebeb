//! Authenticated custody submission for serialized blockchain transactions.

pub mod config;
pub mod custody;
pub mod intent;
pub mod observability;

pub use config::CustodyConfig;
pub use custody::{CustodyError, CustodyPipeline, SubmissionReceipt};
pub use intent::{IntentProducer, TransactionIntent};
