use certum_core::{CredentialId, CredentialRecord, Identity};
use certum_registry::{CredentialRegistry, RegistryError};

/// Read access to registry state needed for verification.
pub trait CredentialSource: Send + Sync {
    /// Ids held by `holder`, ascending.
    fn credentials_of(&self, holder: &Identity) -> Result<Vec<CredentialId>, RegistryError>;

    /// The stored record for `id`.
    fn record(&self, id: CredentialId) -> Result<CredentialRecord, RegistryError>;
}

impl CredentialSource for CredentialRegistry {
    fn credentials_of(&self, holder: &Identity) -> Result<Vec<CredentialId>, RegistryError> {
        Ok(self.get_by_holder(holder))
    }

    fn record(&self, id: CredentialId) -> Result<CredentialRecord, RegistryError> {
        self.get_record(id)
    }
}
