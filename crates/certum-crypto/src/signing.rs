use ed25519_dalek::Signer;

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Detached Ed25519 signature over a request message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    pub const LEN: usize = ed25519_dalek::SIGNATURE_LENGTH;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.0.to_bytes()
    }

    /// Parse a signature, rejecting anything but exactly [`Self::LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw: [u8; Self::LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!(
                "signature must be {} bytes, got {}",
                Self::LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(ed25519_dalek::Signature::from_bytes(&raw)))
    }

    /// Lowercase hex, as carried in request envelopes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidInput(format!("signature is not hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

/// Sign `message` with the key pair's private key.
pub fn sign(message: &[u8], keypair: &KeyPair) -> Signature {
    Signature(keypair.signing_key().sign(message))
}

/// Check `signature` over `message` against `public_key`.
///
/// Uses strict verification, so malleated signatures and small-order keys
/// are rejected.
pub fn verify(
    message: &[u8],
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<(), CryptoError> {
    public_key
        .verifying_key()
        .verify_strict(message, &signature.0)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}
