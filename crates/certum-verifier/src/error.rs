use certum_registry::RegistryError;

/// Failures that abort a whole verification.
///
/// Descriptive-record problems never surface here; they are reported per
/// credential as [`crate::Descriptive::Unavailable`].
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("verification cancelled")]
    Cancelled,
}
