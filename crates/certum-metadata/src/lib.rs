//! Certum Metadata: resolves a credential's reference into its descriptive
//! record, tolerating unreachable or malformed documents.

pub mod cache;
pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod resolver;

pub use cache::CachingResolver;
pub use config::ResolverConfig;
pub use error::ResolutionError;
pub use file::FileMetadataResolver;
pub use http::HttpMetadataResolver;
pub use resolver::{MetadataResolver, SchemeResolver, StaticMetadataResolver};
