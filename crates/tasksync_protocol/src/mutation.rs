//! Mutation actions and record payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of local mutation replayed against the remote authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    /// Record was created locally.
    Create,
    /// Record was updated locally.
    Update,
    /// Record was soft-deleted locally.
    Delete,
}

impl MutationAction {
    /// Returns the wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationAction::Create => "create",
            MutationAction::Update => "update",
            MutationAction::Delete => "delete",
        }
    }
}

/// The wire form of a record's content, carried per item in batch requests.
///
/// Local-only bookkeeping (sync status, server id, last sync time) never
/// crosses the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
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
    /// Timestamp of the mutation being replayed.
    pub updated_at: DateTime<Utc>,
}
