//! RocksDB storage backend for the credential registry.
//!
//! Layout:
//! - `records`: id (u64 BE) → protobuf-encoded record
//! - `holders`: holder (20 bytes) || id (u64 BE) → empty
//! - `meta`: `next_id`, `authority`, `format_version`
//!
//! Every mutation goes through a single synced write batch, so a record and
//! its index entry are either both on disk or both absent.

use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use std::path::Path;

use certum_core::codec::{decode_id, decode_record, encode_record, holder_key, id_key, split_holder_key};
use certum_core::{CoreError, CredentialId, CredentialRecord, Identity};

use crate::error::RegistryError;

/// Column family names for different data types.
const CF_RECORDS: &str = "records";
const CF_HOLDERS: &str = "holders";
const CF_META: &str = "meta";

const META_NEXT_ID: &[u8] = b"next_id";
const META_AUTHORITY: &[u8] = b"authority";
const META_FORMAT_VERSION: &[u8] = b"format_version";

/// Current on-disk layout version.
pub const FORMAT_VERSION: u64 = 1;

/// RocksDB-backed storage for the registry.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_RECORDS, Options::default()),
            ColumnFamilyDescriptor::new(CF_HOLDERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, RegistryError> {
        self.db.cf_handle(name).ok_or_else(|| {
            RegistryError::Corrupt(CoreError::CorruptRecord(format!(
                "column family '{}' not found",
                name
            )))
        })
    }

    fn synced() -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        opts
    }

    fn get_meta_u64(&self, key: &[u8]) -> Result<Option<u64>, RegistryError> {
        self.db
            .get_cf(self.cf(CF_META)?, key)?
            .map(|bytes| decode_id(&bytes).map_err(RegistryError::from))
            .transpose()
    }

    /// The next id to allocate, if the registry has been initialized.
    pub fn next_id(&self) -> Result<Option<CredentialId>, RegistryError> {
        self.get_meta_u64(META_NEXT_ID)
    }

    /// The stored on-disk format version, if any.
    pub fn format_version(&self) -> Result<Option<u64>, RegistryError> {
        self.get_meta_u64(META_FORMAT_VERSION)
    }

    /// The authority recorded when the registry was created.
    pub fn authority(&self) -> Result<Option<Identity>, RegistryError> {
        self.db
            .get_cf(self.cf(CF_META)?, META_AUTHORITY)?
            .map(|bytes| Identity::from_slice(&bytes).map_err(RegistryError::from))
            .transpose()
    }

    /// Write the initial metadata for a fresh registry.
    pub fn initialize(&self, authority: &Identity, first_id: CredentialId) -> Result<(), RegistryError> {
        let meta = self.cf(CF_META)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(meta, META_AUTHORITY, authority.as_bytes());
        batch.put_cf(meta, META_NEXT_ID, id_key(first_id));
        batch.put_cf(meta, META_FORMAT_VERSION, FORMAT_VERSION.to_be_bytes());
        self.db.write_opt(batch, &Self::synced())?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_format_version(&self, version: u64) -> Result<(), RegistryError> {
        self.db
            .put_cf(self.cf(CF_META)?, META_FORMAT_VERSION, version.to_be_bytes())?;
        Ok(())
    }

    /// Durably store a new record, its holder index entry, and the advanced
    /// id counter in one atomic batch.
    pub fn commit_issue(
        &self,
        record: &CredentialRecord,
        next_id: CredentialId,
    ) -> Result<(), RegistryError> {
        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_RECORDS)?, id_key(record.id), encode_record(record));
        batch.put_cf(self.cf(CF_HOLDERS)?, holder_key(&record.holder, record.id), b"");
        batch.put_cf(self.cf(CF_META)?, META_NEXT_ID, id_key(next_id));
        self.db.write_opt(batch, &Self::synced())?;
        Ok(())
    }

    /// Durably overwrite an existing record.
    pub fn commit_update(&self, record: &CredentialRecord) -> Result<(), RegistryError> {
        self.db.put_cf_opt(
            self.cf(CF_RECORDS)?,
            id_key(record.id),
            encode_record(record),
            &Self::synced(),
        )?;
        Ok(())
    }

    /// Get a credential record.
    pub fn get_record(&self, id: CredentialId) -> Result<Option<CredentialRecord>, RegistryError> {
        self.db
            .get_cf(self.cf(CF_RECORDS)?, id_key(id))?
            .map(|bytes| decode_record(&bytes).map_err(RegistryError::from))
            .transpose()
    }

    /// Highest stored record id, if any record exists.
    pub fn last_record_id(&self) -> Result<Option<CredentialId>, RegistryError> {
        let mut iter = self.db.iterator_cf(self.cf(CF_RECORDS)?, IteratorMode::End);
        match iter.next() {
            Some(item) => {
                let (key, _) = item?;
                Ok(Some(decode_id(&key)?))
            }
            None => Ok(None),
        }
    }

    /// Every holder index entry, ordered by holder then id.
    pub fn holder_index(&self) -> Result<Vec<(Identity, CredentialId)>, RegistryError> {
        let iter = self.db.iterator_cf(self.cf(CF_HOLDERS)?, IteratorMode::Start);
        let mut entries = Vec::new();
        for item in iter {
            let (key, _) = item?;
            entries.push(split_holder_key(&key)?);
        }
        Ok(entries)
    }
}
