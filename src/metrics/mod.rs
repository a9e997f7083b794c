//! Run statistics: outcome types, the shared aggregator and snapshots.
mod aggregator;
mod types;


pub use aggregator::StatsAggregator;
pub use types::{
    FailureCounts, FailureKind, LatencySummary, RequestOutcome, RunProgress, RunStats,
    StatsSummary,
};
