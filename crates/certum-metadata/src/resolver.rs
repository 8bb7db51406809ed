use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use certum_core::DescriptiveRecord;

use crate::error::ResolutionError;

/// Trait for resolving a credential reference to its descriptive record.
///
/// Implementations make exactly one fetch attempt per call; retrying is the
/// caller's decision.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Resolve a reference URI to a validated descriptive record.
    async fn resolve(&self, reference: &str) -> Result<DescriptiveRecord, ResolutionError>;
}

#[async_trait]
impl<T: MetadataResolver + ?Sized> MetadataResolver for Arc<T> {
    async fn resolve(&self, reference: &str) -> Result<DescriptiveRecord, ResolutionError> {
        (**self).resolve(reference).await
    }
}

/// Lower-cased scheme of a URI (`https`, `file`, `ipfs`, ...).
pub fn scheme_of(reference: &str) -> Option<String> {
    reference
        .split_once("://")
        .map(|(scheme, _)| scheme.trim().to_ascii_lowercase())
        .filter(|scheme| !scheme.is_empty())
}

/// Dispatches each reference to the resolver registered for its scheme.
pub struct SchemeResolver {
    resolvers: HashMap<String, Arc<dyn MetadataResolver>>,
}

impl SchemeResolver {
    /// Create a resolver with no schemes registered.
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Route `scheme` to `resolver`, replacing any previous registration.
    pub fn register(&mut self, scheme: &str, resolver: Arc<dyn MetadataResolver>) {
        self.resolvers.insert(scheme.to_ascii_lowercase(), resolver);
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.resolvers.keys().cloned().collect();
        schemes.sort();
        schemes
    }
}

impl Default for SchemeResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataResolver for SchemeResolver {
    async fn resolve(&self, reference: &str) -> Result<DescriptiveRecord, ResolutionError> {
        let scheme = scheme_of(reference).ok_or_else(|| {
            ResolutionError::Unreachable(format!("reference has no scheme: {}", reference))
        })?;
        let resolver = self.resolvers.get(&scheme).ok_or_else(|| {
            ResolutionError::Unreachable(format!("no resolver for scheme '{}'", scheme))
        })?;
        resolver.resolve(reference).await
    }
}

/// In-memory resolver over a fixed set of documents.
pub struct StaticMetadataResolver {
    entries: DashMap<String, Result<DescriptiveRecord, ResolutionError>>,
    fetches: AtomicUsize,
}

impl StaticMetadataResolver {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Serve `record` for `reference`.
    pub fn insert(&self, reference: impl Into<String>, record: DescriptiveRecord) {
        self.entries.insert(reference.into(), Ok(record));
    }

    /// Fail resolution of `reference` with `error`.
    pub fn insert_failure(&self, reference: impl Into<String>, error: ResolutionError) {
        self.entries.insert(reference.into(), Err(error));
    }

    /// Number of resolve calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for StaticMetadataResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataResolver for StaticMetadataResolver {
    async fn resolve(&self, reference: &str) -> Result<DescriptiveRecord, ResolutionError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.entries.get(reference) {
            Some(entry) => entry.value().clone(),
            None => Err(ResolutionError::NotFound(reference.to_string())),
        }
    }
}
