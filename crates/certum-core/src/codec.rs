//! On-disk encoding of credential records.
//!
//! Records are stored as protobuf messages so the layout can gain fields
//! without a migration. Keys are big-endian so RocksDB's lexicographic order
//! matches numeric order.

use chrono::{DateTime, Utc};
use prost::Message;

use crate::error::CoreError;
use crate::types::{CredentialId, CredentialRecord, Identity, IDENTITY_LEN};

/// Protobuf form of [`CredentialRecord`].
#[derive(Clone, PartialEq, prost::Message)]
pub struct StoredRecord {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub holder: Vec<u8>,
    #[prost(string, tag = "3")]
    pub reference: String,
    #[prost(bool, tag = "4")]
    pub revoked: bool,
    #[prost(int64, tag = "5")]
    pub issued_at_micros: i64,
    #[prost(int64, optional, tag = "6")]
    pub revoked_at_micros: Option<i64>,
}

impl From<&CredentialRecord> for StoredRecord {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            id: record.id,
            holder: record.holder.as_bytes().to_vec(),
            reference: record.reference.clone(),
            revoked: record.revoked,
            issued_at_micros: record.issued_at.timestamp_micros(),
            revoked_at_micros: record.revoked_at.map(|t| t.timestamp_micros()),
        }
    }
}

impl TryFrom<StoredRecord> for CredentialRecord {
    type Error = CoreError;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let holder = Identity::from_slice(&stored.holder)
            .map_err(|e| CoreError::CorruptRecord(format!("record {}: {}", stored.id, e)))?;
        let issued_at = micros_to_datetime(stored.issued_at_micros)?;
        let revoked_at = stored
            .revoked_at_micros
            .map(micros_to_datetime)
            .transpose()?;
        if stored.revoked != revoked_at.is_some() {
            return Err(CoreError::CorruptRecord(format!(
                "record {}: revoked flag and revocation time disagree",
                stored.id
            )));
        }
        Ok(Self {
            id: stored.id,
            holder,
            reference: stored.reference,
            revoked: stored.revoked,
            issued_at,
            revoked_at,
        })
    }
}

fn micros_to_datetime(micros: i64) -> Result<DateTime<Utc>, CoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| CoreError::CorruptRecord(format!("timestamp out of range: {}", micros)))
}

/// Encode a record for storage.
pub fn encode_record(record: &CredentialRecord) -> Vec<u8> {
    StoredRecord::from(record).encode_to_vec()
}

/// Decode a stored record.
pub fn decode_record(bytes: &[u8]) -> Result<CredentialRecord, CoreError> {
    let stored = StoredRecord::decode(bytes)?;
    CredentialRecord::try_from(stored)
}

/// Storage key for a credential id.
pub fn id_key(id: CredentialId) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decode a credential id from an 8-byte big-endian slice.
pub fn decode_id(bytes: &[u8]) -> Result<CredentialId, CoreError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| CoreError::CorruptRecord(format!("id must be 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// Holder index key: `holder || id`, so a prefix scan on the holder yields
/// that holder's ids in ascending order.
pub fn holder_key(holder: &Identity, id: CredentialId) -> [u8; IDENTITY_LEN + 8] {
    let mut key = [0u8; IDENTITY_LEN + 8];
    key[..IDENTITY_LEN].copy_from_slice(holder.as_bytes());
    key[IDENTITY_LEN..].copy_from_slice(&id.to_be_bytes());
    key
}

/// Split a holder index key back into its parts.
pub fn split_holder_key(key: &[u8]) -> Result<(Identity, CredentialId), CoreError> {
    if key.len() != IDENTITY_LEN + 8 {
        return Err(CoreError::CorruptRecord(format!(
            "holder index key must be {} bytes, got {}",
            IDENTITY_LEN + 8,
            key.len()
        )));
    }
    let holder = Identity::from_slice(&key[..IDENTITY_LEN])?;
    let id = decode_id(&key[IDENTITY_LEN..])?;
    Ok((holder, id))
}
