//! TTL cache in front of another resolver.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::trace;

use certum_core::DescriptiveRecord;

use crate::error::ResolutionError;
use crate::resolver::MetadataResolver;

struct CacheEntry {
    stored_at: Instant,
    record: DescriptiveRecord,
}

/// Caches successful resolutions for a fixed TTL. Failures always go back
/// to the inner resolver.
pub struct CachingResolver<R> {
    inner: R,
    ttl: Duration,
    max_entries: usize,
    entries: DashMap<String, CacheEntry>,
}

impl<R: MetadataResolver> CachingResolver<R> {
    pub fn new(inner: R, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            ttl,
            max_entries,
            entries: DashMap::new(),
        }
    }

    /// Number of cached entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry older than the TTL.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    fn fresh(&self, reference: &str) -> Option<DescriptiveRecord> {
        let entry = self.entries.get(reference)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.record.clone())
        } else {
            None
        }
    }

    fn store(&self, reference: &str, record: &DescriptiveRecord) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(reference) {
            self.purge_expired();
            if self.entries.len() >= self.max_entries {
                return;
            }
        }
        self.entries.insert(
            reference.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                record: record.clone(),
            },
        );
    }
}

#[async_trait]
impl<R: MetadataResolver> MetadataResolver for CachingResolver<R> {
    async fn resolve(&self, reference: &str) -> Result<DescriptiveRecord, ResolutionError> {
        if let Some(record) = self.fresh(reference) {
            trace!(reference, "descriptive record cache hit");
            return Ok(record);
        }
        let record = self.inner.resolve(reference).await?;
        self.store(reference, &record);
        Ok(record)
    }
}
