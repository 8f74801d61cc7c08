//! Batch request and response messages.

use crate::mutation::{MutationAction, RecordPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single mutation within a batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// The record this mutation targets.
    pub record_id: Uuid,
    /// The kind of mutation.
    pub action: MutationAction,
    /// The record content at mutation time. Absent for deletes of records
    /// the store no longer holds.
    pub payload: Option<RecordPayload>,
}

/// An ordered batch of mutations sent to the remote authority in one
/// round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Items in queue order.
    pub items: Vec<BatchItem>,
}

impl BatchRequest {
    /// Creates a new batch request.
    pub fn new(items: Vec<BatchItem>) -> Self {
        Self { items }
    }

    /// Returns the number of items in the batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the batch carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Per-item verdict reported by the remote authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// The mutation was applied.
    Success,
    /// The authority holds a divergent version of the record.
    Conflict,
    /// The mutation was rejected.
    Failure,
}

/// Authoritative fields the remote returns alongside a success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AckData {
    /// Identifier the authority assigned to the record.
    pub server_id: Option<String>,
}

/// The remote authority's version of a record, reported on conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Identifier the authority knows the record by.
    pub server_id: Option<String>,
    /// Record title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Completion flag.
    pub completed: bool,
    /// Soft-delete marker.
    pub is_deleted: bool,
    /// Timestamp of the authority's version, used for resolution.
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a single item within a delivered batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// The record the outcome refers to; response items are matched back to
    /// request items by this id.
    pub record_id: Uuid,
    /// The authority's verdict.
    pub status: ItemStatus,
    /// Authoritative field updates, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AckData>,
    /// The authority's version of the record, on conflict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_record: Option<RemoteRecord>,
    /// Failure detail, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ItemOutcome {
    /// Creates a success outcome with no authoritative data.
    pub fn success(record_id: Uuid) -> Self {
        Self {
            record_id,
            status: ItemStatus::Success,
            data: None,
            server_record: None,
            message: None,
        }
    }

    /// Creates a success outcome carrying authoritative data.
    pub fn success_with(record_id: Uuid, data: AckData) -> Self {
        Self {
            record_id,
            status: ItemStatus::Success,
            data: Some(data),
            server_record: None,
            message: None,
        }
    }

    /// Creates a conflict outcome carrying the authority's version.
    pub fn conflict(record_id: Uuid, server_record: RemoteRecord) -> Self {
        Self {
            record_id,
            status: ItemStatus::Conflict,
            data: None,
            server_record: Some(server_record),
            message: None,
        }
    }

    /// Creates a failure outcome.
    pub fn failure(record_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            record_id,
            status: ItemStatus::Failure,
            data: None,
            server_record: None,
            message: Some(message.into()),
        }
    }
}

/// Response to a batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// One outcome per delivered item.
    pub results: Vec<ItemOutcome>,
}

impl BatchResponse {
    /// Creates a new batch response.
    pub fn new(results: Vec<ItemOutcome>) -> Self {
        Self { results }
    }

    /// Finds the outcome for a record id.
    pub fn outcome_for(&self, record_id: Uuid) -> Option<&ItemOutcome> {
        self.results.iter().find(|r| r.record_id == record_id)
    }
}
