//! CRUD facade that feeds the mutation queue.

use crate::record::{Record, SyncStatus};
use crate::store::{RecordStore, StoreError, StoreResult};
use chrono::Utc;
use std::sync::Arc;
use tasksync_protocol::{MutationAction, SharedQueue};
use tracing::debug;
use uuid::Uuid;

/// Fields a caller may change on an existing record.
#[derive(Debug, Clone, Default)]
pub struct RecordChanges {
    /// New title, when present.
    pub title: Option<String>,
    /// New description, when present.
    pub description: Option<String>,
    /// New completion flag, when present.
    pub completed: Option<bool>,
}

/// Local CRUD operations over a record store.
///
/// Every mutation restamps `updated_at`, resets the record to `Pending`,
/// and appends an entry to the shared mutation queue, in that order, so the
/// queue replays mutations in local commit order.
pub struct RecordTracker<S: RecordStore> {
    store: Arc<S>,
    queue: SharedQueue,
}

impl<S: RecordStore> RecordTracker<S> {
    /// Creates a tracker over a store and the queue shared with the engine.
    pub fn new(store: Arc<S>, queue: SharedQueue) -> Self {
        Self { store, queue }
    }

    /// Creates a record and queues its `create` mutation.
    pub fn create(&self, title: impl Into<String>, description: Option<String>) -> StoreResult<Record> {
        let record = Record::new(title, description);
        self.store.insert(record.clone())?;
        self.queue
            .write()
            .enqueue(record.id, MutationAction::Create, record.updated_at);
        debug!(record = %record.id, "created record");
        Ok(record)
    }

    /// Applies changes to a live record and queues an `update` mutation.
    pub fn update(&self, id: Uuid, changes: RecordChanges) -> StoreResult<Record> {
        let mut record = self.live(id)?;
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(description) = changes.description {
            record.description = Some(description);
        }
        if let Some(completed) = changes.completed {
            record.completed = completed;
        }
        record.updated_at = Utc::now();
        record.sync_status = SyncStatus::Pending;
        let record = self.store.update(record)?;
        self.queue
            .write()
            .enqueue(id, MutationAction::Update, record.updated_at);
        debug!(record = %id, "updated record");
        Ok(record)
    }

    /// Soft-deletes a live record and queues a `delete` mutation.
    ///
    /// The record remains physically stored so the pending mutation can be
    /// replayed.
    pub fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut record = self.live(id)?;
        record.is_deleted = true;
        record.updated_at = Utc::now();
        record.sync_status = SyncStatus::Pending;
        let record = self.store.update(record)?;
        self.queue
            .write()
            .enqueue(id, MutationAction::Delete, record.updated_at);
        debug!(record = %id, "soft-deleted record");
        Ok(())
    }

    /// Fetches a record, excluding soft-deleted ones.
    pub fn get(&self, id: Uuid) -> StoreResult<Option<Record>> {
        Ok(self.store.get(id)?.filter(|r| !r.is_deleted))
    }

    /// Lists live records, oldest first.
    pub fn list(&self) -> StoreResult<Vec<Record>> {
        self.store.list()
    }

    fn live(&self, id: Uuid) -> StoreResult<Record> {
        self.store
            .get(id)?
            .filter(|r| !r.is_deleted)
            .ok_or(StoreError::NotFound(id))
    }
}
