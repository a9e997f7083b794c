//! Core library for the `surge` CLI.
//!
//! The engine runs a fixed pool of async workers against one HTTP target for a
//! bounded time and aggregates their outcomes into consistent snapshots:
//!
//! - [`engine::Engine`] starts, supersedes and cancels runs.
//! - [`engine::RunHandle`] polls live statistics and waits for completion.
//! - [`http::RequestExecutor`] issues single requests and classifies failures.
//! - [`metrics::StatsAggregator`] holds the run's counters and latency samples.
//!
//! The `surge` binary adds argument parsing, config files, live progress and
//! the final summary on top of these.
pub mod args;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod metrics;

#[cfg(test)]
mod test_support;
