//! # TaskSync Store
//!
//! Record model and local storage boundary for TaskSync.
//!
//! This crate provides:
//! - The `Record` data model with soft delete and sync bookkeeping
//! - The `RecordStore` trait the sync engine consumes
//! - `MemoryRecordStore`, the in-memory reference implementation
//! - `RecordTracker`, the CRUD facade that feeds the mutation queue

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod record;
mod store;
mod tracker;

pub use record::{Record, SyncStatus};
pub use store::{MemoryRecordStore, RecordStore, StoreError, StoreResult};
pub use tracker::{RecordChanges, RecordTracker};
