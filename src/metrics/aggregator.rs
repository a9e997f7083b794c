use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::types::{FailureCounts, FailureKind, RequestOutcome, RunProgress, RunStats};

#[derive(Debug, Default)]
struct AggregationState {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    latency_samples: Vec<Duration>,
    failures_by_kind: FailureCounts,
    bytes_received: u64,
    last_update_time: Option<Instant>,
    finished_time: Option<Instant>,
}

/// Shared accumulator for one run.
///
/// All counters and the sample list sit behind one lock, so a `record` is
/// applied as a unit and a `snapshot` never sees a half-applied outcome.
#[derive(Debug)]
pub struct StatsAggregator {
    started_at: DateTime<Utc>,
    start_time: Instant,
    state: Mutex<AggregationState>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAggregator {
    /// Creates an empty aggregator; the run's start time is taken now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            start_time: Instant::now(),
            state: Mutex::new(AggregationState::default()),
        }
    }

    pub fn record(&self, outcome: &RequestOutcome) {
        let now = Instant::now();
        let mut state = self.lock();
        state.total_requests = state.total_requests.saturating_add(1);
        match (outcome.succeeded, outcome.latency) {
            (true, latency) => {
                state.successful_requests = state.successful_requests.saturating_add(1);
                state.latency_samples.push(latency.unwrap_or_default());
                state.bytes_received = state.bytes_received.saturating_add(outcome.response_bytes);
            }
            (false, _) => {
                state.failed_requests = state.failed_requests.saturating_add(1);
                state
                    .failures_by_kind
                    .record(outcome.failure_kind.unwrap_or(FailureKind::Other));
            }
        }
        state.last_update_time = Some(now);
    }

    #[must_use]
    pub fn snapshot(&self) -> RunStats {
        let taken_at = Instant::now();
        let state = self.lock();
        RunStats {
            total_requests: state.total_requests,
            successful_requests: state.successful_requests,
            failed_requests: state.failed_requests,
            latency_samples: state.latency_samples.clone(),
            failures_by_kind: state.failures_by_kind,
            bytes_received: state.bytes_received,
            started_at: self.started_at,
            start_time: self.start_time,
            last_update_time: state.last_update_time,
            finished_time: state.finished_time,
            taken_at,
        }
    }

    /// Counters and timing only; the latency samples are not copied.
    #[must_use]
    pub fn progress(&self) -> RunProgress {
        let taken_at = Instant::now();
        let state = self.lock();
        RunProgress {
            total_requests: state.total_requests,
            successful_requests: state.successful_requests,
            failed_requests: state.failed_requests,
            start_time: self.start_time,
            finished_time: state.finished_time,
            taken_at,
        }
    }

    /// Freezes the elapsed-time reference. Later calls keep the first time.
    pub(crate) fn mark_finished(&self) {
        let now = Instant::now();
        let mut state = self.lock();
        if state.finished_time.is_none() {
            state.finished_time = Some(now);
        }
    }

    fn lock(&self) -> MutexGuard<'_, AggregationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
