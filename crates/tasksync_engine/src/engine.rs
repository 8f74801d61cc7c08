//! Sync pass driver.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::{BatchOutcome, RemoteTransport};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tasksync_protocol::{
    resolve, AckData, BatchItem, BatchRequest, ConflictSide, ItemOutcome, ItemStatus, QueueItem,
    RemoteRecord, SharedQueue,
};
use tasksync_store::{Record, RecordStore, SyncStatus};
use tracing::{debug, info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No pass has run yet.
    Idle,
    /// A pass is in flight.
    Syncing,
    /// The last pass completed.
    Synced,
    /// The last pass aborted on a hard failure.
    Error,
}

impl SyncState {
    /// Returns true if a new pass may start.
    pub fn can_start_sync(&self) -> bool {
        !matches!(self, SyncState::Syncing)
    }
}

/// Aggregate result of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Items the authority confirmed, resolved conflicts included.
    pub success_count: usize,
    /// Items that took the retry path.
    pub failed_count: usize,
    /// Reserved for future use; currently always zero.
    pub skipped_count: usize,
}

/// Running totals across passes, for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed passes, no-ops included.
    pub passes_completed: u64,
    /// Items confirmed across all passes.
    pub items_synced: u64,
    /// Items that took the retry path across all passes.
    pub items_failed: u64,
    /// Conflicts resolved; already part of `items_synced`.
    pub conflicts_resolved: u64,
    /// Last failure message observed.
    pub last_error: Option<String>,
}

/// Drives reconciliation of the local mutation queue with the remote
/// authority.
///
/// One call to [`sync`] performs a full pass: drain the queue snapshot in
/// insertion order, replay it in bounded sequential batches, and fold each
/// item's outcome back into the queue and the record store. Entries leave
/// the queue only on a definitive outcome, so delivery is at-least-once and
/// a pass interrupted mid-flight is safe to rerun.
///
/// [`sync`]: SyncEngine::sync
pub struct SyncEngine<T: RemoteTransport, S: RecordStore> {
    config: SyncConfig,
    transport: Arc<T>,
    store: Arc<S>,
    queue: SharedQueue,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    last_sync: RwLock<Option<DateTime<Utc>>>,
}

impl<T: RemoteTransport, S: RecordStore> SyncEngine<T, S> {
    /// Creates a new sync engine over a shared store and queue.
    pub fn new(config: SyncConfig, transport: T, store: Arc<S>, queue: SharedQueue) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            store,
            queue,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            last_sync: RwLock::new(None),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Number of queue entries, permanently failed ones included.
    pub fn pending_count(&self) -> usize {
        self.queue.read().len()
    }

    /// Time of the last completed pass.
    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.read()
    }

    /// Queue entries that exhausted their retry budget.
    pub fn permanent_failures(&self) -> Vec<QueueItem> {
        self.queue.read().permanent_failures()
    }

    /// Records still awaiting a successful round-trip, for diagnostics.
    pub fn unsynced_records(&self) -> SyncResult<Vec<Record>> {
        Ok(self
            .store
            .list_by_sync_status(&[SyncStatus::Pending, SyncStatus::Error])?)
    }

    /// Bounded reachability test against the authority, for callers gating
    /// a pass. Never mutates state; failure here is not a sync failure.
    pub fn check_connectivity(&self) -> bool {
        self.transport.probe(self.config.connect_timeout)
    }

    /// Performs one full sync pass.
    ///
    /// An empty queue is a no-op returning zero counts. A pass already in
    /// flight is rejected with [`SyncError::SyncInProgress`]; per-item and
    /// per-batch failures are folded into the report, and only local
    /// storage failures abort the pass.
    pub fn sync(&self) -> SyncResult<SyncReport> {
        {
            let mut state = self.state.write();
            if !state.can_start_sync() {
                return Err(SyncError::SyncInProgress);
            }
            *state = SyncState::Syncing;
        }

        let result = self.run_pass();

        match &result {
            Ok(_) => *self.state.write() = SyncState::Synced,
            Err(e) => {
                *self.state.write() = SyncState::Error;
                self.stats.write().last_error = Some(e.to_string());
            }
        }
        result
    }

    fn run_pass(&self) -> SyncResult<SyncReport> {
        let snapshot = self.queue.read().drain_all_ordered();
        let retryable: Vec<QueueItem> = snapshot
            .into_iter()
            .filter(|item| !item.permanent_fail)
            .collect();

        let mut report = SyncReport::default();
        let mut conflicts = 0u64;

        if retryable.is_empty() {
            debug!("mutation queue empty, nothing to sync");
            self.finish_pass(&report, conflicts);
            return Ok(report);
        }

        info!(pending = retryable.len(), "starting sync pass");

        for batch in retryable.chunks(self.config.batch_size.max(1)) {
            let request = self.build_request(batch)?;

            match self.transport.send_batch(&request) {
                BatchOutcome::TransportFailure(reason) => {
                    warn!(size = batch.len(), reason = %reason, "batch transport failure");
                    for item in batch {
                        self.handle_failure(item, &reason)?;
                        report.failed_count += 1;
                    }
                }
                BatchOutcome::Delivered(response) => {
                    for item in batch {
                        match response.outcome_for(item.task_id) {
                            Some(outcome) => {
                                self.handle_outcome(item, outcome, &mut report, &mut conflicts)?;
                            }
                            None => {
                                self.handle_failure(item, "no outcome returned for item")?;
                                report.failed_count += 1;
                            }
                        }
                    }
                }
            }
        }

        info!(
            success = report.success_count,
            failed = report.failed_count,
            "sync pass finished"
        );
        self.finish_pass(&report, conflicts);
        Ok(report)
    }

    fn build_request(&self, batch: &[QueueItem]) -> SyncResult<BatchRequest> {
        let mut items = Vec::with_capacity(batch.len());
        for queued in batch {
            let payload = self
                .store
                .get(queued.task_id)?
                .map(|record| record.to_payload());
            items.push(BatchItem {
                record_id: queued.task_id,
                action: queued.action,
                payload,
            });
        }
        Ok(BatchRequest::new(items))
    }

    fn handle_outcome(
        &self,
        item: &QueueItem,
        outcome: &ItemOutcome,
        report: &mut SyncReport,
        conflicts: &mut u64,
    ) -> SyncResult<()> {
        match outcome.status {
            ItemStatus::Success => {
                self.confirm(item, outcome.data.as_ref())?;
                report.success_count += 1;
            }
            ItemStatus::Conflict => match &outcome.server_record {
                Some(server_record) => {
                    self.resolve_conflict(item, server_record)?;
                    *conflicts += 1;
                    report.success_count += 1;
                }
                None => {
                    self.handle_failure(item, "conflict outcome without server record")?;
                    report.failed_count += 1;
                }
            },
            ItemStatus::Failure => {
                let message = outcome
                    .message
                    .as_deref()
                    .unwrap_or("remote reported failure");
                self.handle_failure(item, message)?;
                report.failed_count += 1;
            }
        }
        Ok(())
    }

    /// Confirms a mutation: records the authority's acknowledgement and
    /// removes the queue entry.
    fn confirm(&self, item: &QueueItem, ack: Option<&AckData>) -> SyncResult<()> {
        if let Some(mut record) = self.store.get(item.task_id)? {
            if let Some(server_id) = ack.and_then(|a| a.server_id.clone()) {
                record.server_id = Some(server_id);
            }
            record.sync_status = SyncStatus::Synced;
            record.last_synced_at = Some(Utc::now());
            self.store.update(record)?;
        }
        self.queue.write().remove(item.queue_id);
        debug!(record = %item.task_id, "mutation confirmed");
        Ok(())
    }

    /// Resolves a conflict by timestamp precedence and confirms the winner
    /// locally. A resolved conflict is a success, not a failure.
    fn resolve_conflict(&self, item: &QueueItem, server_record: &RemoteRecord) -> SyncResult<()> {
        if let Some(mut record) = self.store.get(item.task_id)? {
            match resolve(record.updated_at, server_record.updated_at) {
                ConflictSide::Remote => {
                    info!(record = %item.task_id, "conflict resolved, remote version wins");
                    record.apply_remote(server_record);
                }
                ConflictSide::Local => {
                    info!(record = %item.task_id, "conflict resolved, local version wins");
                }
            }
            record.sync_status = SyncStatus::Synced;
            record.last_synced_at = Some(Utc::now());
            self.store.update(record)?;
        }
        self.queue.write().remove(item.queue_id);
        Ok(())
    }

    /// Routes one item through the retry path.
    fn handle_failure(&self, item: &QueueItem, message: &str) -> SyncResult<()> {
        let new_retry_count = item.retry_count + 1;
        {
            let mut queue = self.queue.write();
            queue.mark_retry(item.queue_id, new_retry_count, message);
            if new_retry_count >= self.config.max_retries {
                queue.mark_permanent_failure(item.queue_id, message);
                warn!(
                    record = %item.task_id,
                    retries = new_retry_count,
                    "mutation permanently failed"
                );
            }
        }

        if let Some(mut record) = self.store.get(item.task_id)? {
            record.sync_status = SyncStatus::Error;
            self.store.update(record)?;
        }
        self.stats.write().last_error = Some(message.to_string());
        Ok(())
    }

    fn finish_pass(&self, report: &SyncReport, conflicts: u64) {
        {
            let mut stats = self.stats.write();
            stats.passes_completed += 1;
            stats.items_synced += report.success_count as u64;
            stats.items_failed += report.failed_count as u64;
            stats.conflicts_resolved += conflicts;
        }
        *self.last_sync.write() = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use tasksync_protocol::{BatchResponse, MutationQueue};
    use tasksync_store::{MemoryRecordStore, Record, RecordTracker};

    fn setup(
        transport: MockTransport,
    ) -> (
        SyncEngine<MockTransport, MemoryRecordStore>,
        RecordTracker<MemoryRecordStore>,
        Arc<MemoryRecordStore>,
    ) {
        let store = Arc::new(MemoryRecordStore::new());
        let queue = MutationQueue::new().into_shared();
        let tracker = RecordTracker::new(Arc::clone(&store), Arc::clone(&queue));
        let engine = SyncEngine::new(
            SyncConfig::new("https://sync.example.com"),
            transport,
            Arc::clone(&store),
            queue,
        );
        (engine, tracker, store)
    }

    fn stored(store: &MemoryRecordStore, id: uuid::Uuid) -> Record {
        store.get(id).unwrap().unwrap()
    }

    #[test]
    fn sync_state_checks() {
        assert!(SyncState::Idle.can_start_sync());
        assert!(SyncState::Synced.can_start_sync());
        assert!(SyncState::Error.can_start_sync());
        assert!(!SyncState::Syncing.can_start_sync());
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        let (engine, _tracker, _store) = setup(MockTransport::new());

        let report = engine.sync().unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(engine.state(), SyncState::Synced);
        assert_eq!(engine.stats().passes_completed, 1);
        assert!(engine.last_sync_time().is_some());
    }

    #[test]
    fn successful_item_is_confirmed() {
        let (engine, tracker, store) = setup(MockTransport::acknowledging());
        let record = tracker.create("Buy milk", None).unwrap();

        let report = engine.sync().unwrap();
        assert_eq!(report.success_count, 1);
        assert_eq!(report.failed_count, 0);
        assert_eq!(report.skipped_count, 0);
        assert_eq!(engine.pending_count(), 0);

        let synced = stored(&store, record.id);
        assert_eq!(synced.sync_status, SyncStatus::Synced);
        assert!(synced.last_synced_at.is_some());
    }

    #[test]
    fn missing_response_item_counts_as_failure() {
        let transport = MockTransport::new();
        transport.push_outcome(BatchOutcome::Delivered(BatchResponse::new(vec![])));
        let (engine, tracker, store) = setup(transport);
        let record = tracker.create("Orphan", None).unwrap();

        let report = engine.sync().unwrap();
        assert_eq!(report.success_count, 0);
        assert_eq!(report.failed_count, 1);

        assert_eq!(engine.pending_count(), 1);
        assert_eq!(stored(&store, record.id).sync_status, SyncStatus::Error);
        assert!(engine.permanent_failures().is_empty());
        assert_eq!(engine.unsynced_records().unwrap().len(), 1);
    }

    #[test]
    fn conflict_without_server_record_counts_as_failure() {
        let transport = MockTransport::new();
        let (engine, tracker, _store) = setup(transport);
        let record = tracker.create("Contested", None).unwrap();

        // Script after create so the record id is known.
        engine.transport.push_outcome(BatchOutcome::Delivered(BatchResponse::new(vec![
            ItemOutcome {
                record_id: record.id,
                status: ItemStatus::Conflict,
                data: None,
                server_record: None,
                message: None,
            },
        ])));

        let report = engine.sync().unwrap();
        assert_eq!(report.failed_count, 1);
        assert_eq!(engine.pending_count(), 1);
    }

    #[test]
    fn remote_failure_message_is_retained() {
        let transport = MockTransport::new();
        let (engine, tracker, _store) = setup(transport);
        let record = tracker.create("Rejected", None).unwrap();

        engine
            .transport
            .push_outcome(BatchOutcome::Delivered(BatchResponse::new(vec![
                ItemOutcome::failure(record.id, "validation failed"),
            ])));

        engine.sync().unwrap();
        let pending = engine.queue.read().drain_all_ordered();
        assert_eq!(pending[0].retry_count, 1);
        assert_eq!(pending[0].error.as_deref(), Some("validation failed"));
        assert_eq!(
            engine.stats().last_error.as_deref(),
            Some("validation failed")
        );
    }

    #[test]
    fn stats_accumulate_across_passes() {
        let (engine, tracker, _store) = setup(MockTransport::acknowledging());
        tracker.create("First", None).unwrap();
        engine.sync().unwrap();
        tracker.create("Second", None).unwrap();
        engine.sync().unwrap();

        let stats = engine.stats();
        assert_eq!(stats.passes_completed, 2);
        assert_eq!(stats.items_synced, 2);
        assert_eq!(stats.items_failed, 0);
    }

    #[test]
    fn connectivity_gate_follows_transport() {
        let transport = MockTransport::new();
        transport.set_reachable(false);
        let (engine, _tracker, _store) = setup(transport);
        assert!(!engine.check_connectivity());
    }
}
