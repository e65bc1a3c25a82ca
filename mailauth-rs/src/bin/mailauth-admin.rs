//! Operator CLI for domain email authentication
//!
//! Provision a sending domain, verify its DNS records against live DNS, and
//! sign a raw message with the stored DKIM key.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailauth_rs::config::EngineConfig;
use mailauth_rs::generator::{provision_domain, setup_instructions, zone_file};
use mailauth_rs::record::DomainRecord;
use mailauth_rs::signer::DkimSigner;
use mailauth_rs::verifier::resolver::TrustDnsResolver;
use mailauth_rs::verifier::DomainVerifier;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mailauth-admin", about = "Domain email authentication admin tool")]
struct Cli {
    /// Path to a TOML config file (defaults are used when absent)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate keys and DNS records for a new sending domain
    Provision {
        domain: String,
        /// Where to write the domain record JSON
        #[arg(long)]
        out: PathBuf,
        /// Print BIND zone-file lines instead of the checklist
        #[arg(long)]
        zone: bool,
    },
    /// Verify a stored domain record against live DNS
    Verify {
        /// Domain record JSON produced by `provision`
        record: PathBuf,
    },
    /// Sign a raw message with a stored domain's DKIM key
    Sign {
        #[arg(long)]
        record: PathBuf,
        /// Raw message file (headers, blank line, body)
        #[arg(long)]
        message: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Provision { domain, out, zone } => {
            let record = provision_domain(&domain, &config)?;
            record.save(&out)?;
            info!("Domain record written to {}", out.display());

            if zone {
                println!("{}", zone_file(&record));
            } else {
                println!("{}", setup_instructions(&record));
            }
            println!("⚠ The record file contains the DKIM private key; encrypt it before storing.");
        }
        Command::Verify { record: path } => {
            let mut record = DomainRecord::load(&path)?;

            let verifier = DomainVerifier::new(TrustDnsResolver::new(&config.dns));
            let report = verifier.verify(&record).await;

            println!("Domain: {}", record.domain);
            for check in &report.checks {
                let status = if check.verified { "✅" } else { "❌" };
                match &check.detail {
                    Some(detail) if !check.verified => {
                        println!("  {} {} ({}): {}", status, check.name, check.purpose, detail)
                    }
                    _ => println!("  {} {} ({})", status, check.name, check.purpose),
                }
            }
            println!("Status: {:?}", report.verification_status);
            println!("Email enabled: {}", report.email_enabled);

            record.apply(report.patch);
            record.save(&path)?;
            info!("Updated record written to {}", path.display());
        }
        Command::Sign { record: path, message } => {
            let record = DomainRecord::load(&path)?;
            let raw = std::fs::read_to_string(&message)
                .with_context(|| format!("failed to read message {}", message.display()))?;

            let signer = DkimSigner::new(
                &record.domain,
                &record.dkim_selector,
                &record.dkim_private_key,
            )?;
            let value = signer.sign_message(&raw)?;

            println!("DKIM-Signature: {}", value);
        }
    }

    Ok(())
}
