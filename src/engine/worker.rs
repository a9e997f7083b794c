use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Url;
use tokio::time::sleep;
use tracing::debug;

use crate::args::HttpMethod;
use crate::http::{IdentityGenerator, RequestExecutor, random_payload};
use crate::metrics::StatsAggregator;

use super::config::{DelayRange, RunPlan};
use super::signal::StopListener;

/// Request template shared read-only by every worker of a run.
#[derive(Debug)]
pub(super) struct WorkerContext {
    executor: RequestExecutor,
    url: Url,
    method: HttpMethod,
    identity: IdentityGenerator,
    delay_range: DelayRange,
    body_size: usize,
}

impl WorkerContext {
    pub(super) fn new(plan: &RunPlan, executor: RequestExecutor) -> Self {
        Self {
            executor,
            url: plan.url.clone(),
            method: plan.method,
            identity: plan.identity.clone(),
            delay_range: plan.delay_range,
            body_size: plan.body_size,
        }
    }
}

pub(super) struct Worker {
    id: usize,
    run_id: u64,
    context: Arc<WorkerContext>,
    stats: Arc<StatsAggregator>,
    stop: StopListener,
    rng: StdRng,
}

impl Worker {
    pub(super) fn new(
        id: usize,
        run_id: u64,
        context: Arc<WorkerContext>,
        stats: Arc<StatsAggregator>,
        stop: StopListener,
        seed: Option<u64>,
    ) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, |seed| {
            StdRng::seed_from_u64(seed.wrapping_add(u64::try_from(id).unwrap_or(u64::MAX)))
        });
        Self {
            id,
            run_id,
            context,
            stats,
            stop,
            rng,
        }
    }

    /// Issues requests until the stop flag is seen. The flag is checked once
    /// per iteration, after the pacing sleep, so an in-flight request is
    /// always completed and recorded.
    pub(super) async fn run(mut self) {
        debug!("Run {} worker {} started.", self.run_id, self.id);
        let mut issued: u64 = 0;

        while !self.stop.is_stopped() {
            let context = Arc::clone(&self.context);
            let headers = context.identity.headers(&mut self.rng);
            let body = context
                .method
                .sends_body()
                .then(|| random_payload(&mut self.rng, context.body_size));

            let outcome = context
                .executor
                .execute(&context.url, context.method, headers, body)
                .await;
            self.stats.record(&outcome);
            issued = issued.saturating_add(1);

            sleep(context.delay_range.sample(&mut self.rng)).await;
        }

        debug!(
            "Run {} worker {} stopped after {} requests.",
            self.run_id, self.id, issued
        );
    }
}
