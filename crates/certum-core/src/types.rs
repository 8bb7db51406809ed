use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::credential_state::{CredentialEvent, CredentialState, CredentialStateMachine};
use crate::error::CoreError;

/// Length of an identity in bytes.
pub const IDENTITY_LEN: usize = 20;

/// Registry-assigned credential identifier. Strictly increasing, never reused.
pub type CredentialId = u64;

/// Account address identifying a holder or the issuing authority.
/// Format: `0x` followed by 40 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// The all-zero address. Never a valid holder or authority.
    pub const NULL: Identity = Identity([0u8; IDENTITY_LEN]);

    /// Create an identity from raw bytes.
    pub fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an identity from a byte slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; IDENTITY_LEN] = bytes.try_into().map_err(|_| {
            CoreError::InvalidIdentity(format!(
                "expected {} bytes, got {}",
                IDENTITY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Parse a hex address, with or without the `0x` prefix, in either case.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != IDENTITY_LEN * 2 {
            return Err(CoreError::InvalidIdentity(format!(
                "address must be {} hex digits, got: {}",
                IDENTITY_LEN * 2,
                s
            )));
        }
        let bytes = hex::decode(digits)
            .map_err(|e| CoreError::InvalidIdentity(format!("{}: {}", s, e)))?;
        Self::from_slice(&bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Whether this is the null (all-zero) address.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; IDENTITY_LEN]
    }

    /// Canonical `0x`-prefixed lowercase hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.to_hex()
    }
}

/// Validate a descriptive-record reference and return its trimmed form.
pub fn validate_reference(reference: &str) -> Result<&str, CoreError> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidReference(
            "reference must be a non-empty string".into(),
        ));
    }
    Ok(trimmed)
}

/// The authoritative registry entry for one issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Registry-assigned identifier.
    pub id: CredentialId,
    /// Identity the credential is bound to. Never changes.
    pub holder: Identity,
    /// URI of the descriptive record. Never changes.
    pub reference: String,
    /// Revocation flag. Only ever goes from false to true.
    pub revoked: bool,
    /// When the credential was issued.
    pub issued_at: DateTime<Utc>,
    /// When the credential was revoked, if it was.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// Create a fresh, non-revoked record.
    ///
    /// Timestamps are truncated to microseconds, the resolution they are
    /// persisted with.
    pub fn new(
        id: CredentialId,
        holder: Identity,
        reference: String,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            holder,
            reference,
            revoked: false,
            issued_at: truncate_micros(issued_at),
            revoked_at: None,
        }
    }

    /// Current revocation state.
    pub fn state(&self) -> CredentialState {
        CredentialState::from_revoked(self.revoked)
    }

    /// Mark the record revoked. Fails if it already is.
    pub fn revoke(&mut self, at: DateTime<Utc>) -> Result<(), CoreError> {
        let next = CredentialStateMachine::transition(self.state(), CredentialEvent::Revoke)?;
        self.revoked = next == CredentialState::Revoked;
        self.revoked_at = Some(truncate_micros(at));
        Ok(())
    }
}

fn truncate_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn test_identity_parse_and_display() {
        let id = Identity::parse(ALICE).unwrap();
        assert_eq!(id.to_string(), ALICE);
        assert_eq!(id.as_bytes(), &[0x11u8; IDENTITY_LEN]);
    }

    #[test]
    fn test_identity_parse_normalizes_case_and_prefix() {
        let upper = Identity::parse("0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD").unwrap();
        let bare = Identity::parse("abcdefabcdefabcdefabcdefabcdefabcdefabcd").unwrap();
        assert_eq!(upper, bare);
        assert_eq!(
            upper.to_string(),
            "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd"
        );
    }

    #[test]
    fn test_identity_rejects_bad_input() {
        assert!(Identity::parse("").is_err());
        assert!(Identity::parse("0x1234").is_err());
        assert!(Identity::parse("0xzz11111111111111111111111111111111111111").is_err());
        assert!(Identity::from_slice(&[1u8; 19]).is_err());
    }

    #[test]
    fn test_identity_null() {
        assert!(Identity::NULL.is_null());
        assert!(Identity::parse("0x0000000000000000000000000000000000000000")
            .unwrap()
            .is_null());
        assert!(!Identity::parse(ALICE).unwrap().is_null());
    }

    #[test]
    fn test_identity_serde_as_string() {
        let id = Identity::parse(ALICE).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", ALICE));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<Identity>("\"0x12\"").is_err());
    }

    #[test]
    fn test_validate_reference() {
        assert_eq!(
            validate_reference("  https://example.org/1.json ").unwrap(),
            "https://example.org/1.json"
        );
        assert!(validate_reference("").is_err());
        assert!(validate_reference("   ").is_err());
    }

    #[test]
    fn test_record_revoke_once() {
        let mut record = CredentialRecord::new(
            1,
            Identity::parse(ALICE).unwrap(),
            "https://example.org/1.json".into(),
            Utc::now(),
        );
        assert_eq!(record.state(), CredentialState::Active);
        record.revoke(Utc::now()).unwrap();
        assert!(record.revoked);
        assert!(record.revoked_at.is_some());

        let first_revoked_at = record.revoked_at;
        assert!(record.revoke(Utc::now()).is_err());
        assert_eq!(record.revoked_at, first_revoked_at);
    }
}
