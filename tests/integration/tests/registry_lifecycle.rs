//! Integration test: registry lifecycle driven by signed requests.
//!
//! Requests are signed with certum-crypto, authenticated the way the node
//! does it, and applied to a RocksDB-backed registry.

use std::sync::Arc;
use std::thread;

use certum_crypto::{KeyPair, RequestAuth, SignedAction};
use certum_integration_tests::{authority_key, identity, open_registry, TempDir};
use certum_registry::{CredentialRegistry, RegistryError};

const NOW: i64 = 1_750_000_000;
const SKEW: u64 = 300;

fn issue_signed(
    registry: &CredentialRegistry,
    signer: &KeyPair,
    holder_byte: u8,
    reference: &str,
) -> Result<u64, RegistryError> {
    let holder = identity(holder_byte);
    let action = SignedAction::Issue {
        holder: &holder,
        reference,
    };
    let auth = RequestAuth::sign(&action, signer, NOW);
    let caller = auth.verify(&action, NOW, SKEW).expect("signature verifies");
    registry.issue(&caller, &holder, reference)
}

// =========================================================================
// Holder ordering and lookups
// =========================================================================

#[test]
fn test_holder_ordering_across_holders() {
    let dir = TempDir::new("certum-it-registry");
    let registry = open_registry(&dir);
    let authority = authority_key();

    // A, A, A, B
    for n in 1..=3 {
        issue_signed(&registry, &authority, 0xa1, &format!("https://example.org/{}.json", n)).unwrap();
    }
    issue_signed(&registry, &authority, 0xb2, "https://example.org/4.json").unwrap();

    assert_eq!(registry.get_by_holder(&identity(0xa1)), vec![1, 2, 3]);
    assert_eq!(registry.get_by_holder(&identity(0xb2)), vec![4]);
    assert!(registry.get_by_holder(&identity(0xc3)).is_empty());
    assert_eq!(registry.total_issued(), 4);
}

#[test]
fn test_get_record_is_idempotent() {
    let dir = TempDir::new("certum-it-registry");
    let registry = open_registry(&dir);
    let id = issue_signed(&registry, &authority_key(), 0xa1, "ipfs://bafy/1.json").unwrap();

    let first = registry.get_record(id).unwrap();
    let second = registry.get_record(id).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.reference, "ipfs://bafy/1.json");
    assert!(!first.revoked);
}

// =========================================================================
// Authorization
// =========================================================================

#[test]
fn test_unauthorized_signer_consumes_no_id() {
    let dir = TempDir::new("certum-it-registry");
    let registry = open_registry(&dir);
    let stranger = KeyPair::generate();

    let result = issue_signed(&registry, &stranger, 0xa1, "https://example.org/x.json");
    assert!(matches!(
        result,
        Err(RegistryError::Unauthorized { caller }) if caller == stranger.identity()
    ));
    assert!(registry.get_by_holder(&identity(0xa1)).is_empty());

    let id = issue_signed(&registry, &authority_key(), 0xa1, "https://example.org/y.json").unwrap();
    assert_eq!(id, 1);
}

#[test]
fn test_tampered_request_never_reaches_registry() {
    let holder = identity(0xa1);
    let signed = SignedAction::Issue {
        holder: &holder,
        reference: "https://example.org/a.json",
    };
    let forged = SignedAction::Issue {
        holder: &holder,
        reference: "https://attacker.example/a.json",
    };
    let auth = RequestAuth::sign(&signed, &authority_key(), NOW);
    assert!(auth.verify(&forged, NOW, SKEW).is_err());
    assert!(auth.verify(&signed, NOW + SKEW as i64 + 1, SKEW).is_err());
}

// =========================================================================
// Revocation
// =========================================================================

#[test]
fn test_revocation_rules() {
    let dir = TempDir::new("certum-it-registry");
    let registry = open_registry(&dir);
    let authority = authority_key().identity();
    let id = issue_signed(&registry, &authority_key(), 0xa1, "https://example.org/1.json").unwrap();

    assert!(matches!(
        registry.revoke(&identity(0x01), id),
        Err(RegistryError::Unauthorized { .. })
    ));
    assert!(!registry.is_revoked(id).unwrap());

    let revoked = registry.revoke(&authority, id).unwrap();
    assert!(revoked.revoked);
    assert!(registry.is_revoked(id).unwrap());

    assert!(matches!(
        registry.revoke(&authority, id),
        Err(RegistryError::AlreadyRevoked(x)) if x == id
    ));
    assert!(matches!(
        registry.revoke(&authority, 99),
        Err(RegistryError::NotFound(99))
    ));
    assert!(matches!(registry.get_record(99), Err(RegistryError::NotFound(99))));
    assert_eq!(registry.total_issued(), 1);
}

// =========================================================================
// Concurrency and persistence
// =========================================================================

#[test]
fn test_concurrent_issuance_yields_distinct_increasing_ids() {
    let dir = TempDir::new("certum-it-registry");
    let registry = Arc::new(open_registry(&dir));
    let authority = authority_key().identity();

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let holder = identity(0x10 + t);
                (0..25)
                    .map(|n| {
                        registry
                            .issue(&authority, &holder, &format!("https://example.org/{}/{}", t, n))
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        let ids = handle.join().unwrap();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        all.extend(ids);
    }
    all.sort_unstable();
    assert_eq!(all, (1..=100).collect::<Vec<_>>());

    for t in 0..4u8 {
        let ids = registry.get_by_holder(&identity(0x10 + t));
        assert_eq!(ids.len(), 25);
        for id in ids {
            assert_eq!(registry.get_record(id).unwrap().holder, identity(0x10 + t));
        }
    }
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new("certum-it-registry");
    {
        let registry = open_registry(&dir);
        issue_signed(&registry, &authority_key(), 0xa1, "https://example.org/1.json").unwrap();
        issue_signed(&registry, &authority_key(), 0xa1, "https://example.org/2.json").unwrap();
        registry.revoke(&authority_key().identity(), 1).unwrap();
    }

    let registry = open_registry(&dir);
    assert_eq!(registry.get_by_holder(&identity(0xa1)), vec![1, 2]);
    assert!(registry.is_revoked(1).unwrap());
    assert!(!registry.is_revoked(2).unwrap());
    assert_eq!(
        issue_signed(&registry, &authority_key(), 0xb2, "https://example.org/3.json").unwrap(),
        3
    );
    drop(registry);

    let other = KeyPair::generate().identity();
    assert!(matches!(
        CredentialRegistry::open(dir.path(), other),
        Err(RegistryError::AuthorityMismatch { .. })
    ));
}
