//! Certum Core: Fundamental types, errors, and encodings for the
//! Certum credential registry.

pub mod codec;
pub mod credential_state;
pub mod descriptive;
pub mod error;
pub mod types;

pub use credential_state::{CredentialEvent, CredentialState, CredentialStateMachine};
pub use descriptive::DescriptiveRecord;
pub use error::CoreError;
pub use types::{validate_reference, CredentialId, CredentialRecord, Identity, IDENTITY_LEN};
