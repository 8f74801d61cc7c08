//! Error types for the sync engine.

use tasksync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Hard failures of a sync pass.
///
/// Transport failures and per-item business failures are not errors here:
/// they become report counts and queue bookkeeping. Only local storage
/// access and an already-running pass abort `sync()`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local record storage failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A sync pass is already in flight.
    #[error("a sync pass is already in progress")]
    SyncInProgress,
}
