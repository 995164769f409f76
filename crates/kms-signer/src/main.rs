use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use kms_signer::{AwsKms, Digest, KmsSigner, SignerConfig};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
struct Args {
    /// KMS key id, ARN or alias of the secp256k1 signing key.
    #[clap(long, env = "KMS_KEY_ID")]
    key_id: String,
    #[clap(long, env = "AWS_REGION")]
    region: Option<String>,
    #[clap(long, env = "KMS_REQUEST_TIMEOUT_SECS", default_value = "15")]
    timeout_secs: u64,
    #[clap(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
    /// Chain id the transaction signer is bound to.
    #[clap(long, env = "CHAIN_ID")]
    chain_id: Option<u64>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the account address derived from the key.
    Address,
    /// Sign a 32-byte hex digest and print the 65-byte signature.
    SignDigest {
        #[clap(long)]
        digest: String,
    },
    /// Build the transaction signer for `--chain-id` and print what it signs for.
    Transactor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("kms_signer={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SignerConfig {
        request_timeout: Duration::from_secs(args.timeout_secs),
    };
    debug!(config = %serde_json::to_string(&config)?, "config");

    let service = AwsKms::from_env(args.region).await;
    let signer = KmsSigner::new(service, config);
    let ctx = signer.context();

    let public_key = signer
        .public_key(&ctx, &args.key_id)
        .await
        .context("resolving public key from KMS")?;
    info!(address = %public_key.address(), "Using public key from AWS KMS");

    match args.command {
        Command::Address => {
            println!("{}", public_key.address());
        }
        Command::SignDigest { digest } => {
            let digest = parse_digest(&digest)?;
            let signature = signer
                .sign_digest(&ctx, &args.key_id, &digest)
                .await
                .context("signing digest")?;
            let output = serde_json::json!({
                "address": public_key.address().to_string(),
                "digest": digest.to_string(),
                "signature": format!("0x{}", hex::encode(signature.as_bytes())),
                "v": signature.v(),
            });
            println!("{output}");
        }
        Command::Transactor => {
            let chain_id = args.chain_id.context("--chain-id is required for transactor")?;
            let transactor = signer
                .transactor(&ctx, &args.key_id, chain_id)
                .await
                .context("building transaction signer")?;
            info!(address = %transactor.address(), chain_id, "transaction signer ready");
            let output = serde_json::json!({
                "key_id": transactor.key_id(),
                "address": transactor.address().to_string(),
                "chain_id": transactor.chain_id(),
            });
            println!("{output}");
        }
    }

    Ok(())
}

fn parse_digest(s: &str) -> Result<Digest> {
    let hex_str = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(hex_str).context("invalid digest hex")?;
    if bytes.len() != 32 {
        bail!("expected 32 bytes, got {}", bytes.len());
    }
    Ok(Digest::from_slice(&bytes))
}
