use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult, EngineError};
use crate::http::RequestExecutor;
use crate::metrics::{RunProgress, RunStats, StatsAggregator};

use super::config::{RunConfig, RunPlan};
use super::signal::StopSignal;
use super::worker::{Worker, WorkerContext};

/// Lifecycle of a run as seen from outside the engine.
///
/// Validation happens synchronously inside [`Engine::start`]; a config that
/// fails it leaves the engine in `Rejected` and no run exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Draining,
    Completed,
    Rejected,
}

#[derive(Debug)]
struct RunShared {
    id: u64,
    stop: StopSignal,
    state: watch::Sender<RunState>,
    stats: Arc<StatsAggregator>,
    superseded: AtomicBool,
    fault: OnceLock<EngineError>,
}

/// Token for one run: cancel it, poll it, wait for it.
///
/// Clones refer to the same run.
#[derive(Debug, Clone)]
pub struct RunHandle {
    shared: Arc<RunShared>,
}

impl RunHandle {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Requests an early, cooperative stop. Repeated calls and calls after
    /// completion do nothing.
    pub fn cancel(&self) {
        if self.shared.stop.raise() {
            info!("Run {}: cancellation requested, draining workers.", self.shared.id);
        }
    }

    /// Latest consistent snapshot of the run's statistics.
    #[must_use]
    pub fn poll(&self) -> RunStats {
        self.shared.stats.snapshot()
    }

    /// Counters and timing only, without copying latency samples.
    #[must_use]
    pub fn progress(&self) -> RunProgress {
        self.shared.stats.progress()
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        *self.shared.state.borrow()
    }

    /// `false` once every worker has returned and the final snapshot is
    /// available.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() != RunState::Completed
    }

    /// Whether a newer run replaced this one before it finished.
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        self.shared.superseded.load(Ordering::Acquire)
    }

    /// Waits for the run to complete and returns its final snapshot.
    ///
    /// # Errors
    ///
    /// Returns the engine fault when a worker task terminated abnormally.
    pub async fn wait(&self) -> Result<RunStats, EngineError> {
        let mut state_rx = self.shared.state.subscribe();
        drop(
            state_rx
                .wait_for(|state| *state == RunState::Completed)
                .await,
        );
        if let Some(fault) = self.shared.fault.get() {
            return Err(fault.clone());
        }
        Ok(self.poll())
    }

    /// A run that already completed is left as it is.
    fn supersede(&self) {
        if self.state() == RunState::Completed {
            return;
        }
        self.shared.superseded.store(true, Ordering::Release);
        if self.shared.stop.raise() {
            warn!("Run {}: superseded by a new run, draining workers.", self.shared.id);
        }
    }
}

#[derive(Debug, Default)]
enum EngineSlot {
    #[default]
    Idle,
    Rejected,
    Active(RunHandle),
}

/// Starts runs and keeps track of the current one. Starting a new run stops
/// the previous one.
#[derive(Debug, Default)]
pub struct Engine {
    slot: Mutex<EngineSlot>,
    next_id: AtomicU64,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `config` and, if it is accepted, supersedes any active run
    /// and spawns `concurrency` workers on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the bad field, an HTTP error when the
    /// client cannot be built, or [`EngineError::NoRuntime`] outside a tokio
    /// runtime. No worker is started in any of these cases.
    pub fn start(&self, config: &RunConfig) -> AppResult<RunHandle> {
        let mut slot = self.lock();
        match prepare_run(config) {
            Ok((runtime, plan, executor)) => {
                if let EngineSlot::Active(previous) = &*slot {
                    previous.supersede();
                }
                let id = self.next_id.fetch_add(1, Ordering::Relaxed).saturating_add(1);
                let handle = spawn_run(&runtime, id, &plan, executor);
                *slot = EngineSlot::Active(handle.clone());
                Ok(handle)
            }
            Err(err) => {
                if let Some(validation) = err.as_validation() {
                    warn!(
                        "Run rejected: invalid {}: {}",
                        validation.field(),
                        validation
                    );
                } else {
                    error!("Run rejected: {}", err);
                }
                if !matches!(&*slot, EngineSlot::Active(_)) {
                    *slot = EngineSlot::Rejected;
                }
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        match &*self.lock() {
            EngineSlot::Idle => RunState::Idle,
            EngineSlot::Rejected => RunState::Rejected,
            EngineSlot::Active(handle) => handle.state(),
        }
    }

    /// Handle of the most recently started run.
    #[must_use]
    pub fn active(&self) -> Option<RunHandle> {
        match &*self.lock() {
            EngineSlot::Active(handle) => Some(handle.clone()),
            EngineSlot::Idle | EngineSlot::Rejected => None,
        }
    }

    /// Cancels the most recently started run, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.active() {
            handle.cancel();
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn prepare_run(config: &RunConfig) -> AppResult<(Handle, RunPlan, RequestExecutor)> {
    let plan = config.validate()?;
    let runtime = Handle::try_current().map_err(|_err| AppError::engine(EngineError::NoRuntime))?;
    let executor = RequestExecutor::new(plan.proxy(), plan.request_timeout)?;
    Ok((runtime, plan, executor))
}

fn spawn_run(runtime: &Handle, id: u64, plan: &RunPlan, executor: RequestExecutor) -> RunHandle {
    let stats = Arc::new(StatsAggregator::new());
    let (state_tx, _) = watch::channel(RunState::Running);
    let shared = Arc::new(RunShared {
        id,
        stop: StopSignal::new(),
        state: state_tx,
        stats: Arc::clone(&stats),
        superseded: AtomicBool::new(false),
        fault: OnceLock::new(),
    });

    info!(
        "Run {}: {} {} with {} workers for {}s.",
        id,
        plan.method,
        plan.url,
        plan.concurrency,
        plan.duration.as_secs()
    );

    let context = Arc::new(WorkerContext::new(plan, executor));
    let mut workers = Vec::with_capacity(plan.concurrency);
    for worker_id in 0..plan.concurrency {
        let worker = Worker::new(
            worker_id,
            id,
            Arc::clone(&context),
            Arc::clone(&stats),
            shared.stop.listener(),
            plan.seed,
        );
        workers.push((worker_id, runtime.spawn(worker.run())));
    }

    runtime.spawn(coordinate(Arc::clone(&shared), workers, plan.duration));

    RunHandle { shared }
}

/// Owns the time budget: raises the stop flag when it runs out (unless a
/// cancel came first), then waits for every worker before completing.
async fn coordinate(
    shared: Arc<RunShared>,
    workers: Vec<(usize, JoinHandle<()>)>,
    duration: Duration,
) {
    let mut stop = shared.stop.listener();
    tokio::select! {
        () = sleep(duration) => {
            if shared.stop.raise() {
                info!("Run {}: duration elapsed, draining workers.", shared.id);
            }
        }
        () = stop.stopped() => {}
    }
    shared.state.send_replace(RunState::Draining);

    for (worker_id, handle) in workers {
        if let Err(err) = handle.await {
            error!("Run {}: worker {} failed: {}", shared.id, worker_id, err);
            drop(shared.fault.set(EngineError::WorkerFailed {
                worker: worker_id,
                message: err.to_string(),
            }));
        }
    }

    shared.stats.mark_finished();
    let progress = shared.stats.progress();
    info!(
        "Run {}: completed with {} requests ({} ok, {} failed).",
        shared.id, progress.total_requests, progress.successful_requests, progress.failed_requests
    );
    shared.state.send_replace(RunState::Completed);
}
