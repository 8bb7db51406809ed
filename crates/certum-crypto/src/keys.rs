use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::path::Path;
use zeroize::Zeroize;

use certum_core::Identity;

use crate::error::CryptoError;
use crate::hashing::derive_identity;

/// Ed25519 key pair held by the authority or a holder.
///
/// The seed is only ever written out through [`KeyPair::save`].
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Fresh key pair from OS entropy.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Deterministic key pair for a known seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Key pair from a seed slice, which must be 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        Ok(keypair)
    }

    /// Load a key pair from a file holding the hex-encoded seed.
    pub fn load(path: &Path) -> Result<Self, CryptoError> {
        let mut contents = std::fs::read_to_string(path)?;
        let decoded = hex::decode(contents.trim())
            .map_err(|e| CryptoError::InvalidInput(format!("invalid key file: {}", e)));
        contents.zeroize();
        let mut bytes = decoded?;
        let keypair = Self::from_bytes(&bytes);
        bytes.zeroize();
        keypair
    }

    /// Write the hex-encoded seed to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CryptoError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut encoded = hex::encode(self.signing_key.to_bytes());
        let result = std::fs::write(path, &encoded);
        encoded.zeroize();
        result?;
        tracing::debug!(path = %path.display(), "key pair written");
        Ok(())
    }

    /// Public half, used to verify request envelopes.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// The account identity controlled by this key pair.
    pub fn identity(&self) -> Identity {
        self.public_key().identity()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

/// Ed25519 public key carried in request envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Parse a 32-byte compressed point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        let verifying_key = VerifyingKey::from_bytes(&raw)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    /// Lowercase hex, as sent in the `public_key` field of a request.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidInput(format!("public key is not hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// The account identity derived from this key.
    pub fn identity(&self) -> Identity {
        derive_identity(self.as_bytes())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}
