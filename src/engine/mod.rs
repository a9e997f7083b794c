//! The load-generation engine: run configuration, workers and the run
//! coordinator.
mod config;
mod coordinator;
mod signal;
mod worker;

#[cfg(test)]
mod tests;

pub use config::{DelayRange, RunConfig, RunPlan};
pub use coordinator::{Engine, RunHandle, RunState};
