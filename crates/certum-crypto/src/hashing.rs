use certum_core::{Identity, IDENTITY_LEN};

/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Derive an account identity from a public key: the last 20 bytes of
/// `BLAKE3(public_key)`.
pub fn derive_identity(public_key: &[u8]) -> Identity {
    let digest = hash(public_key);
    let mut bytes = [0u8; IDENTITY_LEN];
    bytes.copy_from_slice(&digest[digest.len() - IDENTITY_LEN..]);
    Identity::from_bytes(bytes)
}
