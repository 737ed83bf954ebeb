//! Custody submission CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   serialized tx file ──▶ intent ──▶ encoder ──▶ envelope ──▶ signer ──▶ client ──▶ validator
//!                                                    │            │           │
//!                                                 vault id     API signer   Custody API
//!                                                 (config)     key (PEM)    create-and-wait
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use custody_submit::config::{load_config, schema::DEFAULT_ENDPOINT_PATH};
use custody_submit::custody::signer::{self, KeySource, SigningContext};
use custody_submit::intent::{FileEncoding, FileIntent, IntentProducer};
use custody_submit::observability::logging;
use custody_submit::CustodyPipeline;

#[derive(Parser)]
#[command(name = "custody-submit")]
#[command(about = "Submit serialized transactions to a custody signing service", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is unset (overrides the config file).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign and submit a serialized transaction, wait for the custody signature
    Submit {
        #[arg(short, long)]
        config: PathBuf,
        /// File holding the serialized transaction
        #[arg(short, long)]
        tx: PathBuf,
        /// The transaction file is base64 text instead of raw bytes
        #[arg(long)]
        base64: bool,
    },
    /// Print the request body that would be signed and sent
    Envelope {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        tx: PathBuf,
        #[arg(long)]
        base64: bool,
    },
    /// Print a fresh timestamp and signature for an existing request body
    Sign {
        /// PEM-encoded API signer key
        #[arg(short, long)]
        key: PathBuf,
        #[arg(short, long, default_value = DEFAULT_ENDPOINT_PATH)]
        path: String,
        /// File holding the exact request body
        #[arg(short, long)]
        body: PathBuf,
    },
}

fn file_encoding(base64: bool) -> FileEncoding {
    if base64 {
        FileEncoding::Base64
    } else {
        FileEncoding::Raw
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit { config, tx, base64 } => {
            let config = load_config(&config)?;
            logging::init_logging(cli.log_level.as_deref().unwrap_or(&config.observability.log_level));

            let pipeline = CustodyPipeline::from_config(config)?;
            let receipt = pipeline
                .submit_from(&FileIntent::new(tx, file_encoding(base64)))
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Commands::Envelope { config, tx, base64 } => {
            let config = load_config(&config)?;
            logging::init_logging(cli.log_level.as_deref().unwrap_or(&config.observability.log_level));

            let intent = FileIntent::new(tx, file_encoding(base64)).produce().await?;
            let pipeline = CustodyPipeline::from_config(config)?;
            println!("{}", pipeline.prepare(&intent)?);
        }
        Commands::Sign { key, path, body } => {
            logging::init_logging(cli.log_level.as_deref().unwrap_or("info"));

            let body = std::fs::read_to_string(&body)?;
            let context = SigningContext::now(&path, &body)?;
            let signature = signer::sign(
                context.endpoint_path,
                context.timestamp_millis,
                context.request_body,
                &KeySource::file(key),
            )?;
            let output = serde_json::json!({
                "timestamp": context.timestamp_millis,
                "signature": signature.as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
