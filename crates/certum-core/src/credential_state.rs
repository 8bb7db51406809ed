use std::fmt;

use crate::error::CoreError;

/// Revocation state of an issued credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CredentialState {
    /// Issued and not revoked.
    Active,
    /// Permanently revoked. Final state.
    Revoked,
}

impl CredentialState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Map the stored `revoked` flag to a state.
    pub fn from_revoked(revoked: bool) -> Self {
        if revoked {
            Self::Revoked
        } else {
            Self::Active
        }
    }
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Revoked => write!(f, "Revoked"),
        }
    }
}

/// Events that trigger credential state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialEvent {
    /// The authority permanently revokes the credential.
    Revoke,
}

/// Manages credential state transitions.
///
/// The only valid transition is Active → Revoked (Revoke). There is no
/// reinstatement: once revoked, a credential stays revoked.
pub struct CredentialStateMachine;

impl CredentialStateMachine {
    /// Attempt a state transition based on an event.
    /// Returns the new state on success, or an error for invalid transitions.
    pub fn transition(
        current: CredentialState,
        event: CredentialEvent,
    ) -> Result<CredentialState, CoreError> {
        let new_state = match (current, event) {
            (CredentialState::Active, CredentialEvent::Revoke) => CredentialState::Revoked,
            (CredentialState::Revoked, CredentialEvent::Revoke) => {
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: CredentialState::Revoked,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "credential state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: CredentialState, event: CredentialEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
