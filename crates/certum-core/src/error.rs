use crate::credential_state::CredentialState;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: CredentialState,
        to: CredentialState,
    },

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("deserialization error: {0}")]
    DeserializationError(#[from] prost::DecodeError),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error("schema error: {0}")]
    SchemaError(String),
}
