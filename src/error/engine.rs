use thiserror::Error;

/// Faults that should not happen during a normal run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("No tokio runtime is available to spawn workers on.")]
    NoRuntime,
    #[error("Worker {worker} terminated abnormally: {message}")]
    WorkerFailed { worker: usize, message: String },
}
