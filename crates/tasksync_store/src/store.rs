//! Record storage boundary.

use crate::record::{Record, SyncStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists with the given id.
    #[error("record {0} not found")]
    NotFound(Uuid),
    /// A record with the given id already exists.
    #[error("record {0} already exists")]
    Duplicate(Uuid),
    /// The backing storage failed.
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage of records keyed by identifier.
///
/// `get` is a by-id read and returns soft-deleted records too: the sync
/// engine still needs them to replay pending delete mutations. `list`
/// implements the normal-read exclusion of soft-deleted records.
pub trait RecordStore: Send + Sync {
    /// Fetches a record by id, soft-deleted or not.
    fn get(&self, id: Uuid) -> StoreResult<Option<Record>>;

    /// Lists records, excluding soft-deleted ones, oldest first.
    fn list(&self) -> StoreResult<Vec<Record>>;

    /// Inserts a new record.
    fn insert(&self, record: Record) -> StoreResult<()>;

    /// Replaces the stored record with the same id, returning the stored
    /// value.
    fn update(&self, record: Record) -> StoreResult<Record>;

    /// Lists records whose sync status is one of `statuses`, soft-deleted
    /// included, oldest first.
    fn list_by_sync_status(&self, statuses: &[SyncStatus]) -> StoreResult<Vec<Record>>;
}

/// An in-memory record store.
///
/// The reference implementation used in tests and by callers that persist
/// elsewhere.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<Uuid, Record>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records, soft-deleted included.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn sorted(mut records: Vec<Record>) -> Vec<Record> {
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        records
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: Uuid) -> StoreResult<Option<Record>> {
        Ok(self.records.read().get(&id).cloned())
    }

    fn list(&self) -> StoreResult<Vec<Record>> {
        let records = self
            .records
            .read()
            .values()
            .filter(|r| !r.is_deleted)
            .cloned()
            .collect();
        Ok(Self::sorted(records))
    }

    fn insert(&self, record: Record) -> StoreResult<()> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id));
        }
        records.insert(record.id, record);
        Ok(())
    }

    fn update(&self, record: Record) -> StoreResult<Record> {
        let mut records = self.records.write();
        if !records.contains_key(&record.id) {
            return Err(StoreError::NotFound(record.id));
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    fn list_by_sync_status(&self, statuses: &[SyncStatus]) -> StoreResult<Vec<Record>> {
        let records = self
            .records
            .read()
            .values()
            .filter(|r| statuses.contains(&r.sync_status))
            .cloned()
            .collect();
        Ok(Self::sorted(records))
    }
}
