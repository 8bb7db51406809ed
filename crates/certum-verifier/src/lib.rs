//! Certum Verifier: read-only aggregation of a holder's credentials with
//! their revocation status and descriptive records.

pub mod aggregator;
pub mod error;
pub mod source;
pub mod verified;

pub use aggregator::{Verifier, VerifierOptions};
pub use error::VerifyError;
pub use source::CredentialSource;
pub use verified::{Descriptive, VerifiedCredential};
