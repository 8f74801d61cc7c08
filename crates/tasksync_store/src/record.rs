//! The task record data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasksync_protocol::{RecordPayload, RemoteRecord};
use uuid::Uuid;

/// Synchronization state of a record.
///
/// A record is `Pending` or `Error` from the moment of any local mutation
/// until a sync pass confirms success; it becomes `Synced` only after an
/// explicit successful round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Local mutations exist that the remote authority has not confirmed.
    Pending,
    /// The remote authority has acknowledged the record's current state.
    Synced,
    /// The last sync attempt for this record failed.
    Error,
}

/// A task record.
///
/// `is_deleted` is a soft-delete marker: deleted records are excluded from
/// normal reads but remain physically stored so the pending delete mutation
/// can still be replayed against the remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique identifier, immutable after creation.
    pub id: Uuid,
    /// Record title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Completion flag.
    pub completed: bool,
    /// Soft-delete marker.
    pub is_deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Rewritten on every mutation; drives conflict resolution.
    pub updated_at: DateTime<Utc>,
    /// Whether the record is a candidate for the next sync pass.
    pub sync_status: SyncStatus,
    /// Identifier assigned by the remote authority once acknowledged.
    pub server_id: Option<String>,
    /// Time of the last confirmed round-trip for this record.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Creates a new record awaiting its first sync.
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description,
            completed: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            sync_status: SyncStatus::Pending,
            server_id: None,
            last_synced_at: None,
        }
    }

    /// Returns the wire form of this record's content.
    pub fn to_payload(&self) -> RecordPayload {
        RecordPayload {
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Overwrites local content with the authority's version.
    ///
    /// Identity and creation time are untouched; sync bookkeeping is the
    /// caller's responsibility.
    pub fn apply_remote(&mut self, remote: &RemoteRecord) {
        self.title = remote.title.clone();
        self.description = remote.description.clone();
        self.completed = remote.completed;
        self.is_deleted = remote.is_deleted;
        self.updated_at = remote.updated_at;
        if remote.server_id.is_some() {
            self.server_id = remote.server_id.clone();
        }
    }
}
