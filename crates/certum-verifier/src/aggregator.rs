//! Fan-out verification of a holder's credentials.

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use certum_core::{CredentialId, CredentialRecord, Identity};
use certum_metadata::{MetadataResolver, ResolutionError, ResolverConfig};

use crate::error::VerifyError;
use crate::source::CredentialSource;
use crate::verified::{Descriptive, VerifiedCredential};

/// Fetch limits applied during verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierOptions {
    /// Deadline for each individual resolution.
    pub fetch_timeout: Duration,
    /// Maximum resolutions in flight at once.
    pub max_concurrency: usize,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            max_concurrency: 8,
        }
    }
}

impl From<&ResolverConfig> for VerifierOptions {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            fetch_timeout: config.timeout(),
            max_concurrency: config.max_concurrency,
        }
    }
}

/// Combines registry reads with metadata resolution. Never mutates the
/// registry and has no authorization gate.
#[derive(Clone)]
pub struct Verifier {
    source: Arc<dyn CredentialSource>,
    resolver: Arc<dyn MetadataResolver>,
    options: VerifierOptions,
}

impl Verifier {
    pub fn new(
        source: Arc<dyn CredentialSource>,
        resolver: Arc<dyn MetadataResolver>,
        options: VerifierOptions,
    ) -> Self {
        Self {
            source,
            resolver,
            options,
        }
    }

    pub fn options(&self) -> VerifierOptions {
        self.options
    }

    /// Every credential of `holder`, ascending by id, each merged with its
    /// descriptive record or the reason it is unavailable.
    ///
    /// Only registry read failures fail the call. Dropping the returned
    /// future drops every in-flight fetch.
    pub async fn verify_holder(
        &self,
        holder: &Identity,
    ) -> Result<Vec<VerifiedCredential>, VerifyError> {
        let ids = self.source.credentials_of(holder)?;
        let records = ids
            .iter()
            .map(|id| self.source.record(*id))
            .collect::<Result<Vec<_>, _>>()?;

        let verified: Vec<VerifiedCredential> = stream::iter(records)
            .map(|record| self.attach(record))
            .buffered(self.options.max_concurrency.max(1))
            .collect()
            .await;

        let unavailable = verified
            .iter()
            .filter(|v| !v.descriptive.is_available())
            .count();
        info!(
            holder = %holder,
            credentials = verified.len(),
            unavailable,
            "holder verified"
        );
        Ok(verified)
    }

    /// As [`Self::verify_holder`], but gives up with
    /// [`VerifyError::Cancelled`] as soon as `cancel` completes. No partial
    /// result is returned.
    pub async fn verify_holder_until<F>(
        &self,
        holder: &Identity,
        cancel: F,
    ) -> Result<Vec<VerifiedCredential>, VerifyError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                debug!(holder = %holder, "verification cancelled");
                Err(VerifyError::Cancelled)
            }
            result = self.verify_holder(holder) => result,
        }
    }

    /// A single credential merged with its descriptive record.
    pub async fn verify_credential(
        &self,
        id: CredentialId,
    ) -> Result<VerifiedCredential, VerifyError> {
        let record = self.source.record(id)?;
        Ok(self.attach(record).await)
    }

    async fn attach(&self, record: CredentialRecord) -> VerifiedCredential {
        let timeout = self.options.fetch_timeout;
        let descriptive =
            match tokio::time::timeout(timeout, self.resolver.resolve(&record.reference)).await {
                Ok(Ok(descriptive)) => Descriptive::Available(descriptive),
                Ok(Err(err)) => {
                    debug!(credential_id = record.id, error = %err, "descriptive record unavailable");
                    Descriptive::Unavailable(err)
                }
                Err(_) => {
                    debug!(credential_id = record.id, "descriptive record fetch timed out");
                    Descriptive::Unavailable(ResolutionError::Unreachable(format!(
                        "timed out after {} ms",
                        timeout.as_millis()
                    )))
                }
            };
        VerifiedCredential::new(record, descriptive)
    }
}
