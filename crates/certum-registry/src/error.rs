use certum_core::{CoreError, CredentialId, Identity};

/// Credential registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("caller {caller} is not the registry authority")]
    Unauthorized { caller: Identity },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("credential {0} not found")]
    NotFound(CredentialId),

    #[error("credential {0} is already revoked")]
    AlreadyRevoked(CredentialId),

    #[error("registry was created for authority {stored}, refusing to open it for {configured}")]
    AuthorityMismatch {
        stored: Identity,
        configured: Identity,
    },

    #[error("registry uses on-disk format {found:?}, this build reads format {supported}")]
    UnsupportedFormat { found: Option<u64>, supported: u64 },

    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt registry data: {0}")]
    Corrupt(#[from] CoreError),
}

impl RegistryError {
    /// Whether the error comes from the persistent store rather than from
    /// the request itself.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Io(_) | Self::Corrupt(_) | Self::UnsupportedFormat { .. }
        )
    }
}
