use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use certum_core::{validate_reference, CoreError, CredentialId, CredentialRecord, Identity};

use crate::error::RegistryError;
use crate::storage::{Storage, FORMAT_VERSION};

/// The id handed out by a freshly created registry.
pub const FIRST_CREDENTIAL_ID: CredentialId = 1;

/// In-memory view of the allocation counter and holder index, rebuilt from
/// storage at open and updated under the same lock as each durable write.
struct RegistryState {
    next_id: CredentialId,
    holders: HashMap<Identity, Vec<CredentialId>>,
}

/// The authoritative credential registry.
///
/// A single authority identity, fixed when the registry is created, is the
/// only caller allowed to issue or revoke. Queries are open to anyone.
/// Mutations hold the write lock across validation, the synced write, and the
/// cache update; queries hold the read lock and may run in parallel.
pub struct CredentialRegistry {
    storage: Storage,
    authority: Identity,
    state: RwLock<RegistryState>,
}

impl CredentialRegistry {
    /// Open the registry at `path`, creating it for `authority` if it does
    /// not exist yet.
    ///
    /// The authority of an existing registry cannot change: opening it with a
    /// different identity fails with [`RegistryError::AuthorityMismatch`].
    pub fn open(path: &Path, authority: Identity) -> Result<Self, RegistryError> {
        if authority.is_null() {
            return Err(RegistryError::InvalidArgument(
                "authority must not be the null identity".into(),
            ));
        }

        let storage = Storage::open(path)?;
        match storage.authority()? {
            Some(stored) if stored != authority => {
                return Err(RegistryError::AuthorityMismatch {
                    stored,
                    configured: authority,
                });
            }
            Some(_) => {
                let found = storage.format_version()?;
                if found != Some(FORMAT_VERSION) {
                    return Err(RegistryError::UnsupportedFormat {
                        found,
                        supported: FORMAT_VERSION,
                    });
                }
            }
            None => {
                if storage.last_record_id()?.is_some() {
                    return Err(RegistryError::Corrupt(CoreError::CorruptRecord(
                        "records present but no authority recorded".into(),
                    )));
                }
                storage.initialize(&authority, FIRST_CREDENTIAL_ID)?;
                tracing::info!(%authority, path = %path.display(), "created credential registry");
            }
        }

        let state = Self::load_state(&storage)?;
        tracing::info!(
            %authority,
            next_id = state.next_id,
            holders = state.holders.len(),
            "credential registry opened"
        );

        Ok(Self {
            storage,
            authority,
            state: RwLock::new(state),
        })
    }

    fn load_state(storage: &Storage) -> Result<RegistryState, RegistryError> {
        let next_id = storage.next_id()?.ok_or_else(|| {
            RegistryError::Corrupt(CoreError::CorruptRecord("missing id counter".into()))
        })?;
        if let Some(last) = storage.last_record_id()? {
            if last >= next_id {
                return Err(RegistryError::Corrupt(CoreError::CorruptRecord(format!(
                    "id counter {} is not above highest record {}",
                    next_id, last
                ))));
            }
        }

        let mut holders: HashMap<Identity, Vec<CredentialId>> = HashMap::new();
        for (holder, id) in storage.holder_index()? {
            holders.entry(holder).or_default().push(id);
        }

        Ok(RegistryState { next_id, holders })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn authorize(&self, caller: &Identity) -> Result<(), RegistryError> {
        if *caller != self.authority {
            tracing::warn!(%caller, authority = %self.authority, "unauthorized registry mutation");
            return Err(RegistryError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Issue a new credential to `holder`.
    ///
    /// Returns the freshly allocated id only after the record, its index entry
    /// and the advanced counter are durably written. Failed calls allocate
    /// nothing.
    pub fn issue(
        &self,
        caller: &Identity,
        holder: &Identity,
        reference: &str,
    ) -> Result<CredentialId, RegistryError> {
        self.issue_record(caller, holder, reference).map(|record| record.id)
    }

    /// Like [`issue`](Self::issue), returning the record exactly as written.
    pub fn issue_record(
        &self,
        caller: &Identity,
        holder: &Identity,
        reference: &str,
    ) -> Result<CredentialRecord, RegistryError> {
        self.authorize(caller)?;
        if holder.is_null() {
            return Err(RegistryError::InvalidArgument(
                "holder must not be the null identity".into(),
            ));
        }
        let reference =
            validate_reference(reference).map_err(|e| RegistryError::InvalidArgument(e.to_string()))?;

        let mut state = self.write_state();
        let id = state.next_id;
        let next_id = id.checked_add(1).ok_or_else(|| {
            RegistryError::InvalidArgument("credential id space exhausted".into())
        })?;
        let record = CredentialRecord::new(id, *holder, reference.to_string(), Utc::now());

        self.storage.commit_issue(&record, next_id)?;

        state.next_id = next_id;
        state.holders.entry(*holder).or_default().push(id);

        tracing::info!(
            credential_id = id,
            %holder,
            reference = %record.reference,
            "credential issued"
        );

        Ok(record)
    }

    /// Revoke credential `id`. Revocation is permanent.
    ///
    /// Revoking an already revoked credential is an error, not a no-op.
    pub fn revoke(&self, caller: &Identity, id: CredentialId) -> Result<CredentialRecord, RegistryError> {
        self.authorize(caller)?;

        let _state = self.write_state();
        let mut record = self
            .storage
            .get_record(id)?
            .ok_or(RegistryError::NotFound(id))?;

        record.revoke(Utc::now()).map_err(|e| match e {
            CoreError::InvalidStateTransition { .. } => RegistryError::AlreadyRevoked(id),
            other => RegistryError::Corrupt(other),
        })?;

        self.storage.commit_update(&record)?;

        tracing::info!(credential_id = id, holder = %record.holder, "credential revoked");

        Ok(record)
    }

    /// Ids of every credential issued to `holder`, in issuance order.
    pub fn get_by_holder(&self, holder: &Identity) -> Vec<CredentialId> {
        self.read_state()
            .holders
            .get(holder)
            .cloned()
            .unwrap_or_default()
    }

    /// The stored record for `id`.
    pub fn get_record(&self, id: CredentialId) -> Result<CredentialRecord, RegistryError> {
        let _state = self.read_state();
        self.storage
            .get_record(id)?
            .ok_or(RegistryError::NotFound(id))
    }

    /// Whether credential `id` has been revoked.
    pub fn is_revoked(&self, id: CredentialId) -> Result<bool, RegistryError> {
        Ok(self.get_record(id)?.revoked)
    }

    /// The identity allowed to issue and revoke.
    pub fn current_authority(&self) -> Identity {
        self.authority
    }

    /// Number of credentials ever issued, revoked ones included.
    pub fn total_issued(&self) -> u64 {
        self.read_state().next_id - FIRST_CREDENTIAL_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn temp_dir() -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("certum-registry-test-{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn identity(byte: u8) -> Identity {
        Identity::from_bytes([byte; 20])
    }

    fn authority() -> Identity {
        identity(0xA0)
    }

    fn reference(n: u64) -> String {
        format!("https://certs.example.org/metadata/{}.json", n)
    }

    #[test]
    fn test_first_id_is_one_and_ids_increase() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let a = registry.issue(&authority(), &identity(1), &reference(1)).unwrap();
        let b = registry.issue(&authority(), &identity(2), &reference(2)).unwrap();
        let c = registry.issue(&authority(), &identity(1), &reference(3)).unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(registry.total_issued(), 3);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_issue_creates_active_record() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let id = registry
            .issue(&authority(), &identity(1), "  https://certs.example.org/1.json ")
            .unwrap();
        let record = registry.get_record(id).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.holder, identity(1));
        assert_eq!(record.reference, "https://certs.example.org/1.json");
        assert!(!record.revoked);
        assert!(record.revoked_at.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_issue_record_matches_stored_record() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        registry.issue(&authority(), &identity(1), &reference(1)).unwrap();
        let written = registry
            .issue_record(&authority(), &identity(2), " https://certs.example.org/2.json")
            .unwrap();
        assert_eq!(written.id, 2);
        assert_eq!(written.reference, "https://certs.example.org/2.json");
        assert_eq!(registry.get_record(2).unwrap(), written);
        assert!(matches!(
            registry.issue_record(&identity(9), &identity(2), &reference(3)),
            Err(RegistryError::Unauthorized { .. })
        ));
        assert_eq!(registry.total_issued(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unauthorized_issue_consumes_no_id() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let result = registry.issue(&identity(9), &identity(1), &reference(1));
        assert!(matches!(result, Err(RegistryError::Unauthorized { caller }) if caller == identity(9)));
        assert!(registry.get_by_holder(&identity(1)).is_empty());
        assert_eq!(registry.total_issued(), 0);

        let id = registry.issue(&authority(), &identity(1), &reference(1)).unwrap();
        assert_eq!(id, FIRST_CREDENTIAL_ID);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        assert!(matches!(
            registry.issue(&authority(), &Identity::NULL, &reference(1)),
            Err(RegistryError::InvalidArgument(_))
        ));
        assert!(matches!(
            registry.issue(&authority(), &identity(1), "   "),
            Err(RegistryError::InvalidArgument(_))
        ));
        assert_eq!(registry.total_issued(), 0);
        assert_eq!(registry.issue(&authority(), &identity(1), &reference(1)).unwrap(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unauthorized_checked_before_arguments() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let result = registry.issue(&identity(9), &Identity::NULL, "");
        assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_revoke_then_revoke_again() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let id = registry.issue(&authority(), &identity(1), &reference(1)).unwrap();

        let revoked = registry.revoke(&authority(), id).unwrap();
        assert!(revoked.revoked);
        assert!(registry.is_revoked(id).unwrap());

        let again = registry.revoke(&authority(), id);
        assert!(matches!(again, Err(RegistryError::AlreadyRevoked(x)) if x == id));
        let record = registry.get_record(id).unwrap();
        assert!(record.revoked);
        assert_eq!(record.revoked_at, revoked.revoked_at);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_revoke_missing_id() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let id = registry.issue(&authority(), &identity(1), &reference(1)).unwrap();
        let before = registry.get_record(id).unwrap();

        assert!(matches!(
            registry.revoke(&authority(), 42),
            Err(RegistryError::NotFound(42))
        ));
        assert!(matches!(registry.get_record(42), Err(RegistryError::NotFound(42))));
        assert_eq!(registry.get_record(id).unwrap(), before);
        assert_eq!(registry.total_issued(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unauthorized_revoke_changes_nothing() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let id = registry.issue(&authority(), &identity(1), &reference(1)).unwrap();
        assert!(matches!(
            registry.revoke(&identity(1), id),
            Err(RegistryError::Unauthorized { .. })
        ));
        assert!(!registry.is_revoked(id).unwrap());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_get_by_holder_ordering() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let h = identity(1);
        let h2 = identity(2);
        for n in 1..=3 {
            registry.issue(&authority(), &h, &reference(n)).unwrap();
        }
        registry.issue(&authority(), &h2, &reference(4)).unwrap();

        assert_eq!(registry.get_by_holder(&h), vec![1, 2, 3]);
        assert_eq!(registry.get_by_holder(&h2), vec![4]);
        assert!(registry.get_by_holder(&identity(3)).is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_revoked_credentials_stay_in_holder_index() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let id = registry.issue(&authority(), &identity(1), &reference(1)).unwrap();
        registry.revoke(&authority(), id).unwrap();
        assert_eq!(registry.get_by_holder(&identity(1)), vec![id]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_get_record_is_stable() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        let id = registry.issue(&authority(), &identity(1), &reference(1)).unwrap();
        let first = registry.get_record(id).unwrap();
        let second = registry.get_record(id).unwrap();
        assert_eq!(first, second);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = temp_dir();
        {
            let registry = CredentialRegistry::open(&dir, authority()).unwrap();
            registry.issue(&authority(), &identity(1), &reference(1)).unwrap();
            registry.issue(&authority(), &identity(2), &reference(2)).unwrap();
            registry.revoke(&authority(), 1).unwrap();
        }
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        assert_eq!(registry.get_by_holder(&identity(1)), vec![1]);
        assert_eq!(registry.get_by_holder(&identity(2)), vec![2]);
        assert!(registry.is_revoked(1).unwrap());
        assert_eq!(registry.issue(&authority(), &identity(1), &reference(3)).unwrap(), 3);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reopen_with_other_authority_fails() {
        let dir = temp_dir();
        drop(CredentialRegistry::open(&dir, authority()).unwrap());
        let result = CredentialRegistry::open(&dir, identity(0xB0));
        assert!(matches!(
            result,
            Err(RegistryError::AuthorityMismatch { stored, configured })
                if stored == authority() && configured == identity(0xB0)
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reopen_with_unknown_format_fails() {
        let dir = temp_dir();
        drop(CredentialRegistry::open(&dir, authority()).unwrap());
        Storage::open(&dir).unwrap().set_format_version(FORMAT_VERSION + 1).unwrap();
        assert!(matches!(
            CredentialRegistry::open(&dir, authority()),
            Err(RegistryError::UnsupportedFormat { found: Some(v), .. }) if v == FORMAT_VERSION + 1
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_null_authority_rejected() {
        let dir = temp_dir();
        assert!(CredentialRegistry::open(&dir, Identity::NULL).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_current_authority() {
        let dir = temp_dir();
        let registry = CredentialRegistry::open(&dir, authority()).unwrap();
        assert_eq!(registry.current_authority(), authority());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_concurrent_issuance_yields_unique_increasing_ids() {
        let dir = temp_dir();
        let registry = Arc::new(CredentialRegistry::open(&dir, authority()).unwrap());

        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let holder = identity(t + 1);
                    (0..10)
                        .map(|n| registry.issue(&authority(), &holder, &reference(n)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for (t, handle) in handles.into_iter().enumerate() {
            let ids = handle.join().unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(registry.get_by_holder(&identity(t as u8 + 1)), ids);
            for id in ids {
                assert!(all.insert(id), "id {} allocated twice", id);
            }
        }
        assert_eq!(all.len(), 80);
        assert_eq!(all, (1..=80).collect::<HashSet<_>>());
        assert_eq!(registry.total_issued(), 80);
        std::fs::remove_dir_all(&dir).ok();
    }
}
