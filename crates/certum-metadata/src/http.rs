//! HTTP(S) resolver, also serving `ipfs://` references through a gateway.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use certum_core::DescriptiveRecord;

use crate::error::ResolutionError;
use crate::resolver::{scheme_of, MetadataResolver};

/// Fetches descriptive records over HTTP with a bounded body size.
pub struct HttpMetadataResolver {
    client: reqwest::Client,
    max_document_bytes: usize,
    ipfs_gateway: Option<String>,
}

impl HttpMetadataResolver {
    pub fn new(timeout: Duration, max_document_bytes: usize) -> Result<Self, ResolutionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("certum/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolutionError::Unreachable(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            max_document_bytes,
            ipfs_gateway: None,
        })
    }

    /// Serve `ipfs://` references through `gateway` (e.g. `https://ipfs.io`).
    pub fn with_ipfs_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.ipfs_gateway = Some(gateway.into());
        self
    }

    /// The URL actually fetched for `reference`.
    pub fn target_url(&self, reference: &str) -> Result<String, ResolutionError> {
        match scheme_of(reference).as_deref() {
            Some("http") | Some("https") => Ok(reference.to_string()),
            Some("ipfs") => {
                let gateway = self.ipfs_gateway.as_deref().ok_or_else(|| {
                    ResolutionError::Unreachable("no IPFS gateway configured".into())
                })?;
                gateway_url(gateway, reference).ok_or_else(|| {
                    ResolutionError::Unreachable(format!("malformed IPFS reference: {}", reference))
                })
            }
            _ => Err(ResolutionError::Unreachable(format!(
                "unsupported reference: {}",
                reference
            ))),
        }
    }
}

/// Rewrite `ipfs://<cid>/<path>` as `{gateway}/ipfs/<cid>/<path>`.
pub fn gateway_url(gateway: &str, reference: &str) -> Option<String> {
    let (_, rest) = reference.split_once("://")?;
    let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
    if rest.is_empty() || rest.starts_with('/') {
        return None;
    }
    Some(format!("{}/ipfs/{}", gateway.trim_end_matches('/'), rest))
}

fn transport_error(url: &str, err: reqwest::Error) -> ResolutionError {
    if err.is_timeout() {
        ResolutionError::Unreachable(format!("timed out fetching {}", url))
    } else {
        ResolutionError::Unreachable(format!("fetching {}: {}", url, err))
    }
}

#[async_trait]
impl MetadataResolver for HttpMetadataResolver {
    async fn resolve(&self, reference: &str) -> Result<DescriptiveRecord, ResolutionError> {
        let url = self.target_url(reference)?;
        debug!(%url, "fetching descriptive record");

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(ResolutionError::NotFound(format!("{} returned {}", url, status)));
        }
        if !status.is_success() {
            return Err(ResolutionError::Unreachable(format!("{} returned {}", url, status)));
        }

        let too_large = || {
            ResolutionError::InvalidFormat(format!(
                "document exceeds {} bytes",
                self.max_document_bytes
            ))
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_document_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error(&url, e))?
        {
            if body.len() + chunk.len() > self.max_document_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(DescriptiveRecord::from_json(&body)?)
    }
}
