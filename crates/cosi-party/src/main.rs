//! CoSi Party CLI
//!
//! Command-line interface for Ed25519 and collective signing:
//! - Key generation and public key display
//! - Single-signer sign and verify
//! - Local collective signing with absent participants

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use cosi_core::cosign::{self, AggregateSignature, Cosigner, ParticipantSet};
use cosi_core::{sign, KeyPair, PublicKey, SecretKey, SessionConfig};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

/// CoSi Party - Ed25519 collective signing tool
#[derive(Parser)]
#[command(name = "cosi-party")]
#[command(about = "Ed25519 keys, signatures and collective signing")]
#[command(version)]
struct Cli {
    /// Data directory for key files
    #[arg(short, long, env = "COSI_DEST", default_value = "./data")]
    dest: PathBuf,

    /// Treat messages as hex instead of UTF-8 text
    #[arg(long, global = true)]
    hex: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key pair
    Keygen {
        /// Key name
        #[arg(short, long)]
        name: String,
    },

    /// Show a stored public key
    Public {
        /// Key name
        #[arg(short, long)]
        name: String,
    },

    /// Sign a message with a stored key
    Sign {
        /// Key name
        #[arg(short, long)]
        name: String,

        /// Message to sign
        #[arg(short, long)]
        message: String,
    },

    /// Verify a single-signer signature
    Verify {
        /// Public key (hex)
        #[arg(short, long)]
        public_key: String,

        /// Signed message
        #[arg(short, long)]
        message: String,

        /// Signature (hex)
        #[arg(short, long)]
        signature: String,
    },

    /// Collectively sign with stored keys
    Cosign {
        /// Participant key names in order (comma-separated)
        #[arg(short, long)]
        keys: String,

        /// Indices of absent participants (comma-separated)
        #[arg(short, long, default_value = "")]
        absent: String,

        /// Threshold (t-of-n)
        #[arg(short, long, default_value_t = cosi_core::DEFAULT_THRESHOLD)]
        threshold: usize,

        /// Message to sign
        #[arg(short, long)]
        message: String,
    },

    /// Verify a collective signature
    VerifyCosign {
        /// Participant public keys in order (hex, comma-separated)
        #[arg(short, long)]
        public_keys: String,

        /// Signed message
        #[arg(short, long)]
        message: String,

        /// Collective signature R || s || Z (hex)
        #[arg(short, long)]
        signature: String,
    },
}

/// Key file stored under the data directory
#[derive(Serialize, Deserialize)]
struct KeyFile {
    name: String,
    secret_key: String,
    public_key: String,
}

/// Output of a collective signing run
#[derive(Serialize)]
struct CosignOutput {
    aggregate_key: String,
    public_keys: Vec<String>,
    absent: Vec<usize>,
    signature: String,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { ref name } => {
            run_keygen(&cli, name)?;
        }
        Commands::Public { ref name } => {
            show_public(&cli, name)?;
        }
        Commands::Sign {
            ref name,
            ref message,
        } => {
            run_sign(&cli, name, message)?;
        }
        Commands::Verify {
            ref public_key,
            ref message,
            ref signature,
        } => {
            run_verify(&cli, public_key, message, signature)?;
        }
        Commands::Cosign {
            ref keys,
            ref absent,
            threshold,
            ref message,
        } => {
            run_cosign(&cli, keys, absent, threshold, message)?;
        }
        Commands::VerifyCosign {
            ref public_keys,
            ref message,
            ref signature,
        } => {
            run_verify_cosign(&cli, public_keys, message, signature)?;
        }
    }

    Ok(())
}

fn run_keygen(cli: &Cli, name: &str) -> Result<()> {
    std::fs::create_dir_all(&cli.dest)?;

    let path = key_path(&cli.dest, name);
    if path.exists() {
        bail!("Key file {} already exists", path.display());
    }

    let pair = KeyPair::generate(&mut OsRng);
    let file = KeyFile {
        name: name.to_string(),
        secret_key: hex::encode(pair.secret().as_bytes()),
        public_key: hex::encode(pair.public_key().as_bytes()),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&file)?)?;

    info!(
        public_key = %pair.public_key(),
        path = ?path,
        "Key pair generated and saved"
    );

    print_public(pair.public_key());
    Ok(())
}

fn show_public(cli: &Cli, name: &str) -> Result<()> {
    let pair = load_key(&cli.dest, name)?;
    print_public(pair.public_key());
    Ok(())
}

fn run_sign(cli: &Cli, name: &str, message: &str) -> Result<()> {
    let pair = load_key(&cli.dest, name)?;
    let message = parse_message(cli, message)?;

    let signature = pair.sign(&message);

    info!(
        public_key = %pair.public_key(),
        r = hex::encode(signature.r),
        "Signature generated"
    );

    println!("Signature: {}", hex::encode(signature.to_bytes()));
    Ok(())
}

fn run_verify(cli: &Cli, public_key: &str, message: &str, signature: &str) -> Result<()> {
    let public_key = hex::decode(public_key).context("Public key must be hex")?;
    let signature = hex::decode(signature).context("Signature must be hex")?;
    let message = parse_message(cli, message)?;

    let valid = sign::verify(&public_key, &message, &signature);
    println!("Valid: {}", valid);

    if !valid {
        bail!("Signature verification failed");
    }
    Ok(())
}

fn run_cosign(cli: &Cli, keys: &str, absent: &str, threshold: usize, message: &str) -> Result<()> {
    let pairs = split_list(keys)
        .map(|name| load_key(&cli.dest, name))
        .collect::<Result<Vec<_>>>()?;
    let absent: Vec<usize> = split_list(absent)
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Absent indices must be integers")?;
    let message = parse_message(cli, message)?;

    let participants = ParticipantSet::new(pairs.iter().map(|p| *p.public_key()).collect())?;
    if let Some(unknown) = absent.iter().find(|&&i| i >= participants.len()) {
        bail!("Absent index {} is outside the participant list", unknown);
    }

    let signers: Vec<Cosigner> = pairs
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !absent.contains(i))
        .map(|(i, pair)| Cosigner::new(i, pair))
        .collect();

    info!(
        participants = participants.len(),
        signers = signers.len(),
        threshold = threshold,
        "Starting local cosign"
    );

    let config = SessionConfig::new(participants.len(), threshold)?;
    let signature = cosign::run_cosign(&config, &participants, &signers, &message, &mut OsRng)?;

    let output = CosignOutput {
        aggregate_key: participants.aggregate_key().to_string(),
        public_keys: participants.keys().iter().map(|k| k.to_string()).collect(),
        absent: signature.bitmask.absentees().collect(),
        signature: hex::encode(signature.to_bytes()),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_verify_cosign(cli: &Cli, public_keys: &str, message: &str, signature: &str) -> Result<()> {
    let keys = split_list(public_keys)
        .map(|k| -> Result<PublicKey> {
            let bytes = hex::decode(k).context("Public keys must be hex")?;
            Ok(PublicKey::from_bytes(&bytes)?)
        })
        .collect::<Result<Vec<_>>>()?;
    let participants = ParticipantSet::new(keys)?;
    let signature = hex::decode(signature).context("Signature must be hex")?;
    let message = parse_message(cli, message)?;

    let aggregate = participants.aggregate_key();
    let parsed = AggregateSignature::from_bytes(&signature, participants.len())
        .map_err(|e| anyhow!("Malformed collective signature: {}", e))?;

    let valid = cosign::verify_aggregate(&participants, aggregate.as_bytes(), &message, &signature);

    println!("Aggregate Key: {}", aggregate);
    println!(
        "Absent: {:?}",
        parsed.bitmask.absentees().collect::<Vec<_>>()
    );
    println!("Valid: {}", valid);
    if parsed.bitmask.is_empty() {
        println!(
            "Valid (full key): {}",
            cosign::verify_full_key(&participants, aggregate.as_bytes(), &message, &signature)
        );
    }

    if !valid {
        bail!("Collective signature verification failed");
    }
    Ok(())
}

fn key_path(dest: &Path, name: &str) -> PathBuf {
    dest.join(format!("{}.key.json", name))
}

fn load_key(dest: &Path, name: &str) -> Result<KeyPair> {
    let path = key_path(dest, name);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    let file: KeyFile = serde_json::from_str(&json)?;

    let secret = SecretKey::from_bytes(&hex::decode(&file.secret_key)?)?;
    let pair = KeyPair::from_secret(secret);
    if hex::encode(pair.public_key().as_bytes()) != file.public_key {
        bail!("Key file {} has a mismatched public key", path.display());
    }
    Ok(pair)
}

fn parse_message(cli: &Cli, message: &str) -> Result<Vec<u8>> {
    if cli.hex {
        Ok(hex::decode(message).context("Message must be hex")?)
    } else {
        Ok(message.as_bytes().to_vec())
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn print_public(public_key: &PublicKey) {
    println!("Public Key: {}", public_key);
    println!("  base58: {}", bs58::encode(public_key.as_bytes()).into_string());
}
