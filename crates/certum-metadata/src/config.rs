//! Resolver settings and construction of the default resolver stack.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CachingResolver;
use crate::error::ResolutionError;
use crate::file::FileMetadataResolver;
use crate::http::HttpMetadataResolver;
use crate::resolver::{MetadataResolver, SchemeResolver};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Per-fetch timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum concurrent fetches during one verification.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Largest descriptive document accepted, in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
    /// Lifetime of cached resolutions. Zero disables caching.
    #[serde(default)]
    pub cache_ttl_secs: u64,
    /// Upper bound on cached resolutions.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    /// HTTP gateway used for `ipfs://` references. Unset disables the scheme.
    #[serde(default = "default_ipfs_gateway")]
    pub ipfs_gateway: Option<String>,
    /// Whether `file://` references are served from the local filesystem.
    #[serde(default)]
    pub allow_file: bool,
}

fn default_timeout_ms() -> u64 {
    5_000
}
fn default_max_concurrency() -> usize {
    8
}
fn default_max_document_bytes() -> usize {
    1024 * 1024
}
fn default_cache_max_entries() -> usize {
    1024
}
fn default_ipfs_gateway() -> Option<String> {
    Some("https://ipfs.io".into())
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            max_document_bytes: default_max_document_bytes(),
            cache_ttl_secs: 0,
            cache_max_entries: default_cache_max_entries(),
            ipfs_gateway: default_ipfs_gateway(),
            allow_file: false,
        }
    }
}

impl ResolverConfig {
    /// Per-fetch timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Build the scheme-dispatching resolver described by this config,
    /// wrapped in a cache when a TTL is set.
    pub fn build(&self) -> Result<Arc<dyn MetadataResolver>, ResolutionError> {
        let mut http = HttpMetadataResolver::new(self.timeout(), self.max_document_bytes)?;
        if let Some(gateway) = &self.ipfs_gateway {
            http = http.with_ipfs_gateway(gateway.clone());
        }
        let http: Arc<dyn MetadataResolver> = Arc::new(http);

        let mut resolver = SchemeResolver::new();
        resolver.register("http", http.clone());
        resolver.register("https", http.clone());
        if self.ipfs_gateway.is_some() {
            resolver.register("ipfs", http);
        }
        if self.allow_file {
            resolver.register(
                "file",
                Arc::new(FileMetadataResolver::new(self.max_document_bytes)),
            );
        }
        tracing::debug!(schemes = ?resolver.schemes(), "metadata resolver configured");

        if self.cache_ttl_secs == 0 {
            return Ok(Arc::new(resolver));
        }
        Ok(Arc::new(CachingResolver::new(
            resolver,
            Duration::from_secs(self.cache_ttl_secs),
            self.cache_max_entries,
        )))
    }
}
