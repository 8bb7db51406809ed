//! Certum Crypto: Ed25519 keys, signatures, and the signed envelopes that
//! authenticate registry mutations.

pub mod error;
pub mod hashing;
pub mod keys;
pub mod replay;
pub mod request;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{derive_identity, hash};
pub use keys::{KeyPair, PublicKey};
pub use replay::ReplayGuard;
pub use request::{RequestAuth, SignedAction};
pub use signing::{sign, verify, Signature};
