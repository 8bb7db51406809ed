use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use certum_core::{CredentialId, CredentialRecord, DescriptiveRecord, Identity};
use certum_metadata::ResolutionError;

/// Outcome of resolving a credential's reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptive {
    Available(DescriptiveRecord),
    Unavailable(ResolutionError),
}

impl Descriptive {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn record(&self) -> Option<&DescriptiveRecord> {
        match self {
            Self::Available(record) => Some(record),
            Self::Unavailable(_) => None,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum DescriptiveView<'a> {
    Available {
        record: &'a DescriptiveRecord,
    },
    Unavailable {
        kind: &'static str,
        reason: String,
    },
}

impl Serialize for Descriptive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = match self {
            Self::Available(record) => DescriptiveView::Available { record },
            Self::Unavailable(err) => DescriptiveView::Unavailable {
                kind: err.kind(),
                reason: err.to_string(),
            },
        };
        view.serialize(serializer)
    }
}

/// A registry record merged with its descriptive record.
///
/// The revocation flag always comes from the registry, whatever the
/// descriptive side says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedCredential {
    pub id: CredentialId,
    pub holder: Identity,
    pub reference: String,
    pub revoked: bool,
    pub issued_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub descriptive: Descriptive,
}

impl VerifiedCredential {
    pub fn new(record: CredentialRecord, descriptive: Descriptive) -> Self {
        Self {
            id: record.id,
            holder: record.holder,
            reference: record.reference,
            revoked: record.revoked,
            issued_at: record.issued_at,
            revoked_at: record.revoked_at,
            descriptive,
        }
    }
}
