/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("request timestamp {timestamp} is outside the allowed window of {max_skew_secs}s")]
    StaleRequest { timestamp: i64, max_skew_secs: u64 },

    #[error("request envelope was already used")]
    ReplayedRequest,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("key file error: {0}")]
    KeyFile(#[from] std::io::Error),
}
