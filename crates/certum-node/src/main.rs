//! Certum Node: entry point.
//!
//! Starts the Certum node with configuration from a TOML file or defaults.

mod api;
mod commands;
mod config;
mod node;
mod state;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use certum_core::Identity;

use config::{CertumConfig, LoggingConfig};
use node::CertumNode;

/// Certum Node
#[derive(Parser, Debug)]
#[command(name = "certum-node", version, about = "Certum credential registry node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "certum.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the registry authority address.
    #[arg(long)]
    authority: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

/// Initialize tracing. `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        let config = CertumConfig::default();
        init_tracing(&config.logging);
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    // Load configuration
    let mut config = CertumConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(api_port) = args.api_port {
        config.api.port = api_port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(ref authority) = args.authority {
        config.registry.authority = Some(Identity::parse(authority)?);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    tracing::info!("Certum Node v{}", env!("CARGO_PKG_VERSION"));

    // Create and start the node
    let mut node = CertumNode::new(config)?;
    node.start().await?;

    // Set up graceful shutdown on SIGINT
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("received shutdown signal");
    };

    tokio::select! {
        result = node.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "node event loop error");
            }
        }
        _ = shutdown => {
            tracing::info!("initiating graceful shutdown");
        }
    }

    node.shutdown().await?;
    tracing::info!("Certum node exited cleanly");
    Ok(())
}
