//! Certum CLI: command-line interface for the credential registry.
//!
//! Subcommands: keygen, address, issue, revoke, record, holder, verify,
//! authority, status, metadata.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Certum: issue, revoke, and verify credentials.
#[derive(Parser, Debug)]
#[command(name = "certum", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new signing key.
    Keygen(commands::keys::KeygenArgs),
    /// Show the identity address of a key.
    Address(commands::keys::AddressArgs),
    /// Issue a credential (authority key required).
    Issue(commands::issue::IssueArgs),
    /// Revoke a credential (authority key required).
    Revoke(commands::revoke::RevokeArgs),
    /// Show a credential record.
    Record(commands::record::RecordArgs),
    /// List the credential ids held by an identity.
    Holder(commands::holder::HolderArgs),
    /// Verify every credential held by an identity.
    Verify(commands::verify::VerifyArgs),
    /// Show the registry authority.
    Authority(commands::status::AuthorityArgs),
    /// Query the status of a running node.
    Status(commands::status::StatusArgs),
    /// Write a descriptive record JSON file.
    Metadata(commands::metadata::MetadataArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Keygen(args) => commands::keys::keygen(args),
        Commands::Address(args) => commands::keys::address(args),
        Commands::Issue(args) => commands::issue::run(args).await,
        Commands::Revoke(args) => commands::revoke::run(args).await,
        Commands::Record(args) => commands::record::run(args).await,
        Commands::Holder(args) => commands::holder::run(args).await,
        Commands::Verify(args) => commands::verify::run(args).await,
        Commands::Authority(args) => commands::status::authority(args).await,
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Metadata(args) => commands::metadata::run(args),
    }
}
