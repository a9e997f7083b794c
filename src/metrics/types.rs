use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

/// Why a request did not complete. Used for reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Network,
    Timeout,
    Tls,
    Protocol,
    Other,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Timeout => "timeout",
            FailureKind::Tls => "tls",
            FailureKind::Protocol => "protocol",
            FailureKind::Other => "other",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified result of one request. Only successes carry a latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    pub succeeded: bool,
    pub latency: Option<Duration>,
    pub failure_kind: Option<FailureKind>,
    pub status: Option<u16>,
    pub response_bytes: u64,
}

impl RequestOutcome {
    #[must_use]
    pub const fn success(latency: Duration, status: u16, response_bytes: u64) -> Self {
        Self {
            succeeded: true,
            latency: Some(latency),
            failure_kind: None,
            status: Some(status),
            response_bytes,
        }
    }

    #[must_use]
    pub const fn failure(kind: FailureKind, status: Option<u16>) -> Self {
        Self {
            succeeded: false,
            latency: None,
            failure_kind: Some(kind),
            status,
            response_bytes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounts {
    pub network: u64,
    pub timeout: u64,
    pub tls: u64,
    pub protocol: u64,
    pub other: u64,
}

impl FailureCounts {
    pub(crate) fn record(&mut self, kind: FailureKind) {
        let slot = match kind {
            FailureKind::Network => &mut self.network,
            FailureKind::Timeout => &mut self.timeout,
            FailureKind::Tls => &mut self.tls,
            FailureKind::Protocol => &mut self.protocol,
            FailureKind::Other => &mut self.other,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.network
            .saturating_add(self.timeout)
            .saturating_add(self.tls)
            .saturating_add(self.protocol)
            .saturating_add(self.other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
}

/// Point-in-time copy of a run's statistics.
///
/// Invariants of every snapshot: `total_requests == successful_requests +
/// failed_requests` and `latency_samples.len() == successful_requests`.
/// Derived values (rate, latency summary) are computed on demand.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub latency_samples: Vec<Duration>,
    pub failures_by_kind: FailureCounts,
    pub bytes_received: u64,
    pub started_at: DateTime<Utc>,
    pub start_time: Instant,
    pub last_update_time: Option<Instant>,
    pub finished_time: Option<Instant>,
    pub taken_at: Instant,
}

impl RunStats {
    /// Wall time covered by this snapshot; frozen once the run has completed.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.progress().elapsed()
    }

    /// Total requests per second over [`RunStats::elapsed`]; 0.0 before any
    /// time has passed.
    #[must_use]
    pub fn requests_per_sec(&self) -> f64 {
        self.progress().requests_per_sec()
    }

    /// The counter and timing part of this snapshot.
    #[must_use]
    pub const fn progress(&self) -> RunProgress {
        RunProgress {
            total_requests: self.total_requests,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            start_time: self.start_time,
            finished_time: self.finished_time,
            taken_at: self.taken_at,
        }
    }

    /// Failed share of all requests, 0.0 when nothing was sent yet.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.failed_requests as f64 / self.total_requests as f64
    }

    /// Min/max/average success latency; `None` until the first success.
    #[must_use]
    pub fn latency(&self) -> Option<LatencySummary> {
        let min = self.latency_samples.iter().min().copied()?;
        let max = self.latency_samples.iter().max().copied()?;
        let sum_nanos: u128 = self
            .latency_samples
            .iter()
            .fold(0u128, |acc, sample| acc.saturating_add(sample.as_nanos()));
        let count = u128::try_from(self.latency_samples.len()).unwrap_or(u128::MAX);
        let avg_nanos = sum_nanos.checked_div(count).unwrap_or(0);
        let avg = Duration::from_nanos(u64::try_from(avg_nanos).unwrap_or(u64::MAX));
        Some(LatencySummary { min, max, avg })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_time.is_some()
    }

    #[must_use]
    pub fn summary(&self) -> StatsSummary {
        let latency = self.latency();
        StatsSummary {
            started_at: self.started_at,
            elapsed_secs: self.elapsed().as_secs_f64(),
            finished: self.is_finished(),
            total_requests: self.total_requests,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            requests_per_sec: self.requests_per_sec(),
            error_rate: self.error_rate(),
            bytes_received: self.bytes_received,
            latency_min_ms: latency.map(|summary| duration_ms(summary.min)),
            latency_max_ms: latency.map(|summary| duration_ms(summary.max)),
            latency_avg_ms: latency.map(|summary| duration_ms(summary.avg)),
            failures_by_kind: self.failures_by_kind,
        }
    }
}

/// Counters and timing of a run without the latency samples. Cheap enough to
/// take on every progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunProgress {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub start_time: Instant,
    pub finished_time: Option<Instant>,
    pub taken_at: Instant,
}

impl RunProgress {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.finished_time
            .unwrap_or(self.taken_at)
            .saturating_duration_since(self.start_time)
    }

    #[must_use]
    pub fn requests_per_sec(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.total_requests as f64 / secs
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished_time.is_some()
    }
}

/// Serializable digest of a [`RunStats`] snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub finished: bool,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub requests_per_sec: f64,
    pub error_rate: f64,
    pub bytes_received: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_min_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_max_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_avg_ms: Option<f64>,
    pub failures_by_kind: FailureCounts,
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
