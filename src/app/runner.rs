use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::args::TesterArgs;
use crate::engine::Engine;
use crate::error::AppResult;
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

use super::progress::ProgressReporter;
use super::summary::print_summary;

/// Floor for the live statistics interval.
const MIN_STATS_INTERVAL: Duration = Duration::from_millis(50);

/// Runs one load test from the CLI: start, report progress until the run
/// completes (or a shutdown signal cancels it), then print the final summary.
pub(crate) async fn run_local(args: &TesterArgs) -> AppResult<()> {
    let engine = Engine::new();
    let handle = engine.start(&args.run_config())?;

    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_task = setup_signal_shutdown_handler(&shutdown_tx);

    let reporter = ProgressReporter::new(
        Duration::from_secs(args.target_duration),
        args.no_color,
    );
    let mut ticker = tokio::time::interval(args.stats_interval.max(MIN_STATS_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    let wait = handle.wait();
    tokio::pin!(wait);
    let mut cancelled = false;

    let result = loop {
        tokio::select! {
            result = &mut wait => break result,
            _ = shutdown_rx.recv(), if !cancelled => {
                cancelled = true;
                info!("Shutdown requested, stopping run {}.", handle.id());
                handle.cancel();
            }
            _ = ticker.tick() => {
                reporter.report(&handle.progress());
            }
        }
    };

    drop(shutdown_tx.send(()));
    drop(signal_task.await);

    let stats = result?;
    reporter.finish(&stats.progress());
    print_summary(&stats, args.json)
}
