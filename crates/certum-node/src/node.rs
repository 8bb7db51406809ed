//! The Certum node orchestrator.
//!
//! Opens the registry, builds the resolver stack, serves the HTTP API in a
//! background task, and runs the single-writer loop that applies registry
//! mutations.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use certum_registry::{CredentialRegistry, RegistryError};
use certum_verifier::{Verifier, VerifierOptions};

use crate::commands::{IssueResponse, NodeCommand, RevokeResponse};
use crate::config::CertumConfig;
use crate::state::NodeState;

/// Capacity of the API → event loop command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 256;

/// The Certum node.
pub struct CertumNode {
    /// Node configuration.
    config: CertumConfig,
    /// The credential registry.
    registry: Arc<CredentialRegistry>,
    /// Verification aggregator.
    verifier: Verifier,
    /// Shared state accessible from HTTP handlers.
    node_state: Option<Arc<NodeState>>,
    /// Receives commands from the HTTP API.
    command_rx: Option<mpsc::Receiver<NodeCommand>>,
}

impl CertumNode {
    /// Open the registry and build the verifier described by `config`.
    pub fn new(config: CertumConfig) -> Result<Self> {
        let authority = config.authority()?;
        let registry = Arc::new(CredentialRegistry::open(&config.registry_path(), authority)?);
        let resolver = config.resolver.build()?;
        let verifier = Verifier::new(
            registry.clone(),
            resolver,
            VerifierOptions::from(&config.resolver),
        );

        tracing::info!(
            %authority,
            total_issued = registry.total_issued(),
            "Certum node created"
        );

        Ok(Self {
            config,
            registry,
            verifier,
            node_state: None,
            command_rx: None,
        })
    }

    /// Start the HTTP API.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!("starting Certum node");

        let (command_tx, command_rx) = mpsc::channel::<NodeCommand>(COMMAND_CHANNEL_CAPACITY);
        let node_state = Arc::new(NodeState::new(
            self.registry.clone(),
            self.verifier.clone(),
            self.config.auth.max_clock_skew_secs,
            command_tx,
        ));

        let api_addr: SocketAddr = self.config.api_addr().parse()?;
        let listener = tokio::net::TcpListener::bind(api_addr).await?;
        let api_state = node_state.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::api::serve(listener, api_state).await {
                tracing::error!(error = %e, "HTTP API server error");
            }
        });

        self.node_state = Some(node_state);
        self.command_rx = Some(command_rx);

        Ok(())
    }

    /// Run the event loop until the command channel closes.
    pub async fn run(&mut self) -> Result<()> {
        let command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        process_commands(self.registry.clone(), command_rx).await;
        Ok(())
    }

    /// Gracefully shut down the node.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down Certum node");
        self.node_state = None;
        self.command_rx = None;
        tracing::info!(total_issued = self.registry.total_issued(), "Certum node shut down");
        Ok(())
    }
}

/// Apply registry mutations one at a time, in arrival order.
///
/// Each mutation runs to completion on a blocking thread even if the
/// requester has gone away.
pub async fn process_commands(
    registry: Arc<CredentialRegistry>,
    mut command_rx: mpsc::Receiver<NodeCommand>,
) {
    tracing::info!("entering main event loop");
    while let Some(command) = command_rx.recv().await {
        handle_command(&registry, command).await;
    }
    tracing::info!("API command channel closed");
}

async fn handle_command(registry: &Arc<CredentialRegistry>, command: NodeCommand) {
    match command {
        NodeCommand::Issue {
            caller,
            holder,
            reference,
            reply,
        } => {
            let registry = registry.clone();
            let outcome = tokio::task::spawn_blocking(move || -> Result<IssueResponse, RegistryError> {
                let record = registry.issue_record(&caller, &holder, &reference)?;
                Ok(IssueResponse {
                    id: record.id,
                    holder: record.holder,
                    reference: record.reference,
                })
            })
            .await;
            match outcome {
                Ok(result) => {
                    let _ = reply.send(result);
                }
                Err(e) => tracing::error!(error = %e, "issue task failed"),
            }
        }
        NodeCommand::Revoke { caller, id, reply } => {
            let registry = registry.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                registry.revoke(&caller, id).map(|record| RevokeResponse {
                    id: record.id,
                    revoked: record.revoked,
                    revoked_at: record.revoked_at,
                })
            })
            .await;
            match outcome {
                Ok(result) => {
                    let _ = reply.send(result);
                }
                Err(e) => tracing::error!(error = %e, credential_id = id, "revoke task failed"),
            }
        }
    }
}
