//! Commands dispatched from the HTTP API to the node event loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use certum_core::{CredentialId, Identity};
use certum_registry::RegistryError;

/// A registry mutation sent from the HTTP API to the node's event loop.
///
/// The caller has already been authenticated; the registry still applies
/// its own authority check.
pub enum NodeCommand {
    /// Issue a credential to a holder.
    Issue {
        caller: Identity,
        holder: Identity,
        reference: String,
        reply: oneshot::Sender<Result<IssueResponse, RegistryError>>,
    },
    /// Revoke a credential.
    Revoke {
        caller: Identity,
        id: CredentialId,
        reply: oneshot::Sender<Result<RevokeResponse, RegistryError>>,
    },
}

/// Response after issuing a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueResponse {
    pub id: CredentialId,
    pub holder: Identity,
    pub reference: String,
}

/// Response after revoking a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub id: CredentialId,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}
