//! Ordered ledger of pending local mutations.

use crate::mutation::MutationAction;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// A single pending (or failed) mutation awaiting remote reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    /// Identifier of the queue entry itself. A record accumulates a fresh
    /// entry per mutation, so this is distinct from the record id.
    pub queue_id: Uuid,
    /// The record this mutation targets.
    pub task_id: Uuid,
    /// The kind of mutation to replay.
    pub action: MutationAction,
    /// Timestamp of the mutation that produced this entry.
    pub updated_at: DateTime<Utc>,
    /// Failed remote attempts so far.
    pub retry_count: u32,
    /// Set once the retry budget is exhausted. The entry stays queued for
    /// inspection but is no longer retried automatically.
    pub permanent_fail: bool,
    /// Last observed failure message.
    pub error: Option<String>,
}

/// An append-only, ordered ledger of pending mutations.
///
/// # Invariants
///
/// - Entries are appended in mutation order and drained in insertion order,
///   so a later update is never replayed before an earlier one for the same
///   record.
/// - Entries are removed only on a confirmed outcome (success or resolved
///   conflict); failures keep the entry with updated bookkeeping.
#[derive(Debug)]
pub struct MutationQueue {
    items: VecDeque<QueueItem>,
}

impl MutationQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Appends a new entry for a mutation. No deduplication: three updates
    /// before a sync pass produce three entries, replayed in order.
    ///
    /// Returns the created entry.
    pub fn enqueue(
        &mut self,
        task_id: Uuid,
        action: MutationAction,
        updated_at: DateTime<Utc>,
    ) -> QueueItem {
        let item = QueueItem {
            queue_id: Uuid::new_v4(),
            task_id,
            action,
            updated_at,
            retry_count: 0,
            permanent_fail: false,
            error: None,
        };
        self.items.push_back(item.clone());
        item
    }

    /// Returns the full queue contents in insertion order.
    ///
    /// Non-destructive: entries are removed only via [`remove`].
    ///
    /// [`remove`]: MutationQueue::remove
    pub fn drain_all_ordered(&self) -> Vec<QueueItem> {
        self.items.iter().cloned().collect()
    }

    /// Removes an entry after a confirmed success or resolved conflict.
    ///
    /// Returns false if no entry with that id exists.
    pub fn remove(&mut self, queue_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.queue_id != queue_id);
        self.items.len() < before
    }

    /// Records a failed attempt on an entry.
    ///
    /// Returns false if no entry with that id exists.
    pub fn mark_retry(
        &mut self,
        queue_id: Uuid,
        new_retry_count: u32,
        message: impl Into<String>,
    ) -> bool {
        match self.items.iter_mut().find(|item| item.queue_id == queue_id) {
            Some(item) => {
                item.retry_count = new_retry_count;
                item.error = Some(message.into());
                true
            }
            None => false,
        }
    }

    /// Marks an entry as permanently failed, excluding it from automatic
    /// retry while keeping it visible for inspection.
    ///
    /// Returns false if no entry with that id exists.
    pub fn mark_permanent_failure(&mut self, queue_id: Uuid, message: impl Into<String>) -> bool {
        match self.items.iter_mut().find(|item| item.queue_id == queue_id) {
            Some(item) => {
                item.permanent_fail = true;
                item.error = Some(message.into());
                true
            }
            None => false,
        }
    }

    /// Returns the permanently failed entries, for operator inspection.
    pub fn permanent_failures(&self) -> Vec<QueueItem> {
        self.items
            .iter()
            .filter(|item| item.permanent_fail)
            .cloned()
            .collect()
    }

    /// Returns the total number of entries, permanently failed included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wraps the queue for sharing between the CRUD layer and the engine.
    pub fn into_shared(self) -> SharedQueue {
        Arc::new(RwLock::new(self))
    }
}

impl Default for MutationQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// A mutation queue shared between the CRUD layer and the sync engine.
///
/// CRUD appends may interleave with a sync pass: the pass works on a drained
/// snapshot and removes entries by queue id, so entries appended mid-pass
/// simply surface in the next pass.
pub type SharedQueue = Arc<RwLock<MutationQueue>>;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_action(code: u8) -> MutationAction {
        match code % 3 {
            0 => MutationAction::Create,
            1 => MutationAction::Update,
            _ => MutationAction::Delete,
        }
    }

    #[test]
    fn enqueue_assigns_fresh_queue_ids() {
        let mut queue = MutationQueue::new();
        let task = Uuid::new_v4();
        let now = Utc::now();

        let a = queue.enqueue(task, MutationAction::Create, now);
        let b = queue.enqueue(task, MutationAction::Update, now);

        assert_ne!(a.queue_id, b.queue_id);
        assert_eq!(a.retry_count, 0);
        assert!(!a.permanent_fail);
    }

    #[test]
    fn drain_is_non_destructive_and_ordered() {
        let mut queue = MutationQueue::new();
        let task = Uuid::new_v4();
        let now = Utc::now();

        let first = queue.enqueue(task, MutationAction::Create, now);
        let second = queue.enqueue(task, MutationAction::Update, now);

        let drained = queue.drain_all_ordered();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].queue_id, first.queue_id);
        assert_eq!(drained[1].queue_id, second.queue_id);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn remove_deletes_only_the_target() {
        let mut queue = MutationQueue::new();
        let now = Utc::now();

        let a = queue.enqueue(Uuid::new_v4(), MutationAction::Create, now);
        let b = queue.enqueue(Uuid::new_v4(), MutationAction::Create, now);

        assert!(queue.remove(a.queue_id));
        assert!(!queue.remove(a.queue_id));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_all_ordered()[0].queue_id, b.queue_id);
    }

    #[test]
    fn retry_bookkeeping() {
        let mut queue = MutationQueue::new();
        let item = queue.enqueue(Uuid::new_v4(), MutationAction::Update, Utc::now());

        assert!(queue.mark_retry(item.queue_id, 1, "connection refused"));
        let drained = queue.drain_all_ordered();
        assert_eq!(drained[0].retry_count, 1);
        assert_eq!(drained[0].error.as_deref(), Some("connection refused"));
        assert!(!drained[0].permanent_fail);

        assert!(queue.mark_permanent_failure(item.queue_id, "gave up"));
        let failures = queue.permanent_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error.as_deref(), Some("gave up"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn marking_unknown_entry_is_a_no_op() {
        let mut queue = MutationQueue::new();
        assert!(!queue.mark_retry(Uuid::new_v4(), 1, "x"));
        assert!(!queue.mark_permanent_failure(Uuid::new_v4(), "x"));
    }

    proptest! {
        #[test]
        fn drain_preserves_insertion_order(actions in prop::collection::vec(0u8..3, 1..40)) {
            let mut queue = MutationQueue::new();
            let now = Utc::now();
            let mut expected = Vec::new();
            for code in actions {
                let item = queue.enqueue(Uuid::new_v4(), make_action(code), now);
                expected.push(item.queue_id);
            }

            let drained: Vec<Uuid> =
                queue.drain_all_ordered().iter().map(|i| i.queue_id).collect();
            prop_assert_eq!(drained, expected);
        }

        #[test]
        fn later_enqueues_never_reorder_drained_items(
            first in prop::collection::vec(0u8..3, 1..20),
            second in prop::collection::vec(0u8..3, 1..20),
        ) {
            let mut queue = MutationQueue::new();
            let now = Utc::now();
            for code in first {
                queue.enqueue(Uuid::new_v4(), make_action(code), now);
            }
            let drained_once: Vec<Uuid> =
                queue.drain_all_ordered().iter().map(|i| i.queue_id).collect();

            for code in second {
                queue.enqueue(Uuid::new_v4(), make_action(code), now);
            }
            let drained_twice: Vec<Uuid> =
                queue.drain_all_ordered().iter().map(|i| i.queue_id).collect();

            prop_assert_eq!(&drained_twice[..drained_once.len()], &drained_once[..]);
        }
    }
}
