//! One-time use of signed request envelopes.
//!
//! A signature stays on record until its timestamp falls outside the clock
//! skew window. After that, [`RequestAuth::verify`] rejects the envelope as
//! stale anyway.
//!
//! [`RequestAuth::verify`]: crate::request::RequestAuth::verify

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::CryptoError;
use crate::request::RequestAuth;

/// Remembers the signatures of accepted envelopes.
///
/// Thread-safe: uses `DashMap` for concurrent access.
pub struct ReplayGuard {
    max_skew_secs: u64,
    /// Signature hex -> last unix second at which the envelope is fresh.
    seen: DashMap<String, i64>,
}

impl ReplayGuard {
    pub fn new(max_skew_secs: u64) -> Self {
        Self {
            max_skew_secs,
            seen: DashMap::new(),
        }
    }

    /// Record `auth` as used, failing if it was accepted before.
    ///
    /// Call only after the envelope has been verified, so that unsigned
    /// noise never takes up space.
    pub fn check_and_record(&self, auth: &RequestAuth, now: i64) -> Result<(), CryptoError> {
        self.sweep(now);
        let expires_at = auth.timestamp.saturating_add(self.skew());
        match self.seen.entry(auth.signature.to_ascii_lowercase()) {
            Entry::Occupied(_) => {
                tracing::warn!(timestamp = auth.timestamp, "replayed request envelope");
                Err(CryptoError::ReplayedRequest)
            }
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
                Ok(())
            }
        }
    }

    /// Drop signatures whose envelopes can no longer pass the freshness check.
    pub fn sweep(&self, now: i64) {
        self.seen.retain(|_, expires_at| *expires_at >= now);
    }

    /// Number of signatures currently remembered.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn skew(&self) -> i64 {
        i64::try_from(self.max_skew_secs).unwrap_or(i64::MAX)
    }
}
