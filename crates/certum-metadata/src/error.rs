use certum_core::CoreError;

/// Why a descriptive record could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// Network failure, timeout, server error, or no way to fetch the scheme.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// Fetched, but not a valid descriptive record.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The remote explicitly reported the document as absent.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ResolutionError {
    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "unreachable",
            Self::InvalidFormat(_) => "invalid_format",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl From<CoreError> for ResolutionError {
    fn from(err: CoreError) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}
