//! # TaskSync Protocol
//!
//! Wire contract and mutation ledger for TaskSync.
//!
//! This crate provides:
//! - `MutationAction` and `RecordPayload` for replayable local changes
//! - `MutationQueue`, the ordered ledger of pending mutations
//! - Batch request/response messages exchanged with the remote authority
//! - Deterministic last-write-wins conflict resolution
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod conflict;
mod messages;
mod mutation;
mod queue;

pub use conflict::{resolve, ConflictSide};
pub use messages::{
    AckData, BatchItem, BatchRequest, BatchResponse, ItemOutcome, ItemStatus, RemoteRecord,
};
pub use mutation::{MutationAction, RecordPayload};
pub use queue::{MutationQueue, QueueItem, SharedQueue};
