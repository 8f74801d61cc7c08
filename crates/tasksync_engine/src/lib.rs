//! # TaskSync Engine
//!
//! Offline-first synchronization engine for TaskSync.
//!
//! This crate provides:
//! - The sync pass driver draining the mutation queue in batches
//! - Deterministic conflict application (last write wins, ties local)
//! - Retry and permanent-failure bookkeeping
//! - HTTP transport abstraction with a blocking reqwest client
//! - Connectivity probing
//!
//! ## Architecture
//!
//! Local CRUD appends mutations to the shared queue; an external trigger
//! calls [`SyncEngine::sync`], which replays the queue against the remote
//! authority in bounded, strictly sequential batches and folds per-item
//! outcomes back into the queue and the record store.
//!
//! ## Key Invariants
//!
//! - Mutations replay in local commit order (FIFO across and within batches)
//! - At-least-once delivery: queue entries leave only on a definitive outcome
//! - A resolved conflict counts as success
//! - Transport and per-item failures never escape `sync()`; only local
//!   storage failures do

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod http;
mod transport;

pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncReport, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpTransport, LoopbackClient, LoopbackServer, ReqwestClient};
pub use transport::{BatchOutcome, MockTransport, RemoteTransport};
