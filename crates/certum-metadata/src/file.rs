use async_trait::async_trait;
use std::io;

use certum_core::DescriptiveRecord;

use crate::error::ResolutionError;
use crate::resolver::MetadataResolver;

/// Resolves `file://` references from the local filesystem.
pub struct FileMetadataResolver {
    max_document_bytes: usize,
}

impl FileMetadataResolver {
    pub fn new(max_document_bytes: usize) -> Self {
        Self { max_document_bytes }
    }
}

fn io_error(path: &str, err: io::Error) -> ResolutionError {
    match err.kind() {
        io::ErrorKind::NotFound => ResolutionError::NotFound(path.to_string()),
        _ => ResolutionError::Unreachable(format!("{}: {}", path, err)),
    }
}

#[async_trait]
impl MetadataResolver for FileMetadataResolver {
    async fn resolve(&self, reference: &str) -> Result<DescriptiveRecord, ResolutionError> {
        let path = match reference.split_once("://") {
            Some((scheme, path)) if scheme.eq_ignore_ascii_case("file") => path,
            _ => {
                return Err(ResolutionError::Unreachable(format!(
                    "not a file reference: {}",
                    reference
                )))
            }
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| io_error(path, e))?;
        if metadata.len() > self.max_document_bytes as u64 {
            return Err(ResolutionError::InvalidFormat(format!(
                "document exceeds {} bytes",
                self.max_document_bytes
            )));
        }
        let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
        Ok(DescriptiveRecord::from_json(&bytes)?)
    }
}
