//! Transport layer abstraction for batch reconciliation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tasksync_protocol::{BatchRequest, BatchResponse, ItemOutcome};

/// Outcome of one batch round-trip.
///
/// A transport-level failure is data, not an error: the engine routes every
/// item of the affected batch through the per-item retry path, while an
/// item-level failure inside a delivered response touches only that item.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// The authority received the batch and judged each item.
    Delivered(BatchResponse),
    /// The round-trip itself failed; no item reached a definitive outcome.
    TransportFailure(String),
}

/// Network communication with the remote authority.
///
/// This trait abstracts the network layer, allowing different
/// implementations (HTTP, in-process loopback, mock for testing).
pub trait RemoteTransport: Send + Sync {
    /// Sends one batch and reports how the round-trip went.
    fn send_batch(&self, request: &BatchRequest) -> BatchOutcome;

    /// Bounded reachability test against the authority. Never mutates state.
    fn probe(&self, timeout: Duration) -> bool;
}

/// A mock transport for testing.
///
/// Outcomes are scripted with [`push_outcome`] and consumed in order; with
/// [`acknowledging`] the mock answers unscripted batches by acknowledging
/// every item. Sent requests are captured for inspection.
///
/// [`push_outcome`]: MockTransport::push_outcome
/// [`acknowledging`]: MockTransport::acknowledging
pub struct MockTransport {
    outcomes: Mutex<VecDeque<BatchOutcome>>,
    requests: Mutex<Vec<BatchRequest>>,
    reachable: AtomicBool,
    auto_ack: bool,
}

impl MockTransport {
    /// Creates a mock that fails unscripted batches at the transport level.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
            auto_ack: false,
        }
    }

    /// Creates a mock that acknowledges every item of unscripted batches.
    pub fn acknowledging() -> Self {
        Self {
            auto_ack: true,
            ..Self::new()
        }
    }

    /// Queues the outcome for the next batch.
    pub fn push_outcome(&self, outcome: BatchOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Sets whether the probe reports the authority as reachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Returns the batches sent so far.
    pub fn requests(&self) -> Vec<BatchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteTransport for MockTransport {
    fn send_batch(&self, request: &BatchRequest) -> BatchOutcome {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(outcome) = self.outcomes.lock().unwrap().pop_front() {
            return outcome;
        }
        if self.auto_ack {
            let results = request
                .items
                .iter()
                .map(|item| ItemOutcome::success(item.record_id))
                .collect();
            BatchOutcome::Delivered(BatchResponse::new(results))
        } else {
            BatchOutcome::TransportFailure("no scripted outcome".into())
        }
    }

    fn probe(&self, _timeout: Duration) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasksync_protocol::{BatchItem, ItemStatus, MutationAction};
    use uuid::Uuid;

    fn make_request() -> BatchRequest {
        BatchRequest::new(vec![BatchItem {
            record_id: Uuid::new_v4(),
            action: MutationAction::Create,
            payload: None,
        }])
    }

    #[test]
    fn scripted_outcomes_consume_in_order() {
        let transport = MockTransport::new();
        transport.push_outcome(BatchOutcome::TransportFailure("down".into()));
        transport.push_outcome(BatchOutcome::Delivered(BatchResponse::new(vec![])));

        assert!(matches!(
            transport.send_batch(&make_request()),
            BatchOutcome::TransportFailure(_)
        ));
        assert!(matches!(
            transport.send_batch(&make_request()),
            BatchOutcome::Delivered(_)
        ));
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn unscripted_batches_fail_by_default() {
        let transport = MockTransport::new();
        assert!(matches!(
            transport.send_batch(&make_request()),
            BatchOutcome::TransportFailure(_)
        ));
    }

    #[test]
    fn acknowledging_mock_accepts_every_item() {
        let transport = MockTransport::acknowledging();
        let request = make_request();
        match transport.send_batch(&request) {
            BatchOutcome::Delivered(response) => {
                assert_eq!(response.results.len(), 1);
                assert_eq!(response.results[0].status, ItemStatus::Success);
                assert_eq!(response.results[0].record_id, request.items[0].record_id);
            }
            BatchOutcome::TransportFailure(reason) => panic!("unexpected failure: {reason}"),
        }
    }

    #[test]
    fn probe_follows_reachability() {
        let transport = MockTransport::new();
        assert!(transport.probe(Duration::from_secs(1)));
        transport.set_reachable(false);
        assert!(!transport.probe(Duration::from_secs(1)));
    }
}
