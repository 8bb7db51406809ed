//! Certum Registry: the authoritative record of which credentials exist,
//! who holds them, and whether they have been revoked.

pub mod error;
pub mod registry;
pub mod storage;

pub use error::RegistryError;
pub use registry::CredentialRegistry;
pub use storage::Storage;
