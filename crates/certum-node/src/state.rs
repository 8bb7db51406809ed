//! Shared node state for HTTP handlers.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use certum_crypto::ReplayGuard;
use certum_registry::CredentialRegistry;
use certum_verifier::Verifier;

use crate::commands::NodeCommand;

/// Shared state for the running node, accessible from HTTP handlers.
pub struct NodeState {
    /// Registry, used directly for reads.
    pub registry: Arc<CredentialRegistry>,
    /// Verification aggregator over the same registry.
    pub verifier: Verifier,
    /// When the node started.
    pub start_time: Instant,
    /// Accepted distance between a signed request's timestamp and now.
    pub max_clock_skew_secs: u64,
    /// Signatures of envelopes already accepted within the skew window.
    pub replay_guard: ReplayGuard,
    /// Channel to send mutations to the event loop.
    pub command_tx: mpsc::Sender<NodeCommand>,
}

impl NodeState {
    pub fn new(
        registry: Arc<CredentialRegistry>,
        verifier: Verifier,
        max_clock_skew_secs: u64,
        command_tx: mpsc::Sender<NodeCommand>,
    ) -> Self {
        Self {
            registry,
            verifier,
            start_time: Instant::now(),
            max_clock_skew_secs,
            replay_guard: ReplayGuard::new(max_clock_skew_secs),
            command_tx,
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
