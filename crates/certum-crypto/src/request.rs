//! Signed request envelopes.
//!
//! A mutating request carries the caller's public key, a timestamp, and a
//! signature over a canonical message naming the action. The verifier derives
//! the caller identity from the key; the registry then decides whether that
//! identity is allowed to act.

use serde::{Deserialize, Serialize};

use certum_core::{CredentialId, Identity};

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};
use crate::signing::{sign, verify, Signature};

/// A registry mutation, as covered by a request signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedAction<'a> {
    Issue {
        holder: &'a Identity,
        reference: &'a str,
    },
    Revoke {
        id: CredentialId,
    },
}

impl SignedAction<'_> {
    /// Canonical bytes to sign for this action at `timestamp`.
    pub fn message(&self, timestamp: i64) -> Vec<u8> {
        match self {
            Self::Issue { holder, reference } => {
                format!("certum/v1/issue\n{}\n{}\n{}", holder, reference, timestamp)
            }
            Self::Revoke { id } => format!("certum/v1/revoke\n{}\n{}", id, timestamp),
        }
        .into_bytes()
    }
}

/// Authentication block attached to a mutating request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAuth {
    /// Hex-encoded Ed25519 public key (32 bytes).
    pub public_key: String,
    /// Hex-encoded signature over the action message (64 bytes).
    pub signature: String,
    /// Unix seconds at which the request was signed.
    pub timestamp: i64,
}

impl RequestAuth {
    /// Sign an action at the given timestamp.
    pub fn sign(action: &SignedAction<'_>, keypair: &KeyPair, timestamp: i64) -> Self {
        let signature = sign(&action.message(timestamp), keypair);
        Self {
            public_key: keypair.public_key().to_hex(),
            signature: signature.to_hex(),
            timestamp,
        }
    }

    /// Sign an action with the current time.
    pub fn sign_now(action: &SignedAction<'_>, keypair: &KeyPair) -> Self {
        Self::sign(action, keypair, chrono::Utc::now().timestamp())
    }

    /// Check freshness and signature, returning the authenticated caller.
    pub fn verify(
        &self,
        action: &SignedAction<'_>,
        now: i64,
        max_skew_secs: u64,
    ) -> Result<Identity, CryptoError> {
        if now.abs_diff(self.timestamp) > max_skew_secs {
            return Err(CryptoError::StaleRequest {
                timestamp: self.timestamp,
                max_skew_secs,
            });
        }
        let public_key = PublicKey::from_hex(&self.public_key)?;
        let signature = Signature::from_hex(&self.signature)?;
        verify(&action.message(self.timestamp), &signature, &public_key)?;
        Ok(public_key.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn holder() -> Identity {
        Identity::from_bytes([0x22; 20])
    }

    #[test]
    fn test_message_format() {
        let h = holder();
        let issue = SignedAction::Issue {
            holder: &h,
            reference: "https://example.org/1.json",
        };
        assert_eq!(
            String::from_utf8(issue.message(NOW)).unwrap(),
            format!("certum/v1/issue\n{}\nhttps://example.org/1.json\n{}", h, NOW)
        );
        let revoke = SignedAction::Revoke { id: 9 };
        assert_eq!(
            String::from_utf8(revoke.message(NOW)).unwrap(),
            "certum/v1/revoke\n9\n1700000000"
        );
    }

    #[test]
    fn test_verify_returns_signer_identity() {
        let kp = KeyPair::generate();
        let action = SignedAction::Revoke { id: 3 };
        let auth = RequestAuth::sign(&action, &kp, NOW);
        let caller = auth.verify(&action, NOW + 10, 300).unwrap();
        assert_eq!(caller, kp.identity());
    }

    #[test]
    fn test_signature_bound_to_action() {
        let kp = KeyPair::generate();
        let auth = RequestAuth::sign(&SignedAction::Revoke { id: 3 }, &kp, NOW);
        let result = auth.verify(&SignedAction::Revoke { id: 4 }, NOW, 300);
        assert!(matches!(result, Err(CryptoError::SignatureVerificationFailed)));
    }

    #[test]
    fn test_issue_signature_bound_to_reference() {
        let kp = KeyPair::generate();
        let h = holder();
        let signed = SignedAction::Issue {
            holder: &h,
            reference: "https://example.org/a.json",
        };
        let tampered = SignedAction::Issue {
            holder: &h,
            reference: "https://example.org/b.json",
        };
        let auth = RequestAuth::sign(&signed, &kp, NOW);
        assert!(auth.verify(&signed, NOW, 300).is_ok());
        assert!(auth.verify(&tampered, NOW, 300).is_err());
    }

    #[test]
    fn test_stale_request_rejected() {
        let kp = KeyPair::generate();
        let action = SignedAction::Revoke { id: 1 };
        let auth = RequestAuth::sign(&action, &kp, NOW - 301);
        assert!(matches!(
            auth.verify(&action, NOW, 300),
            Err(CryptoError::StaleRequest { .. })
        ));
        let future = RequestAuth::sign(&action, &kp, NOW + 301);
        assert!(future.verify(&action, NOW, 300).is_err());
    }

    #[test]
    fn test_malformed_fields_rejected() {
        let kp = KeyPair::generate();
        let action = SignedAction::Revoke { id: 1 };
        let mut auth = RequestAuth::sign(&action, &kp, NOW);
        auth.public_key = "zz".into();
        assert!(matches!(
            auth.verify(&action, NOW, 300),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_auth_json_shape() {
        let kp = KeyPair::from_seed(&[5u8; 32]);
        let auth = RequestAuth::sign(&SignedAction::Revoke { id: 1 }, &kp, NOW);
        let json = serde_json::to_value(&auth).unwrap();
        assert_eq!(json["timestamp"], NOW);
        assert_eq!(json["public_key"].as_str().unwrap().len(), 64);
        assert_eq!(json["signature"].as_str().unwrap().len(), 128);
    }
}
