use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::{Instant, sleep, timeout};

use super::{DelayRange, Engine, RunConfig, RunHandle, RunState};
use crate::args::HttpMethod;
use crate::error::{AppError, EngineError, ValidationError};
use crate::metrics::RunStats;
use crate::test_support::{ServerBehavior, run_async_test, spawn_test_server};

const WAIT_LIMIT: Duration = Duration::from_secs(15);

fn fast_config(url: &str, concurrency: usize, duration_secs: u64) -> RunConfig {
    RunConfig {
        concurrency,
        duration_secs,
        request_timeout: Duration::from_secs(2),
        delay_range: DelayRange {
            min: Duration::from_millis(5),
            max: Duration::from_millis(15),
        },
        seed: Some(7),
        ..RunConfig::new(url)
    }
}

async fn wait_for(handle: &RunHandle) -> Result<RunStats, String> {
    timeout(WAIT_LIMIT, handle.wait())
        .await
        .map_err(|_err| format!("Run {} did not complete in time", handle.id()))?
        .map_err(|err| format!("Run {} failed: {}", handle.id(), err))
}

fn check_invariants(stats: &RunStats) -> Result<(), String> {
    if stats.total_requests
        != stats
            .successful_requests
            .saturating_add(stats.failed_requests)
    {
        return Err(format!("Counters out of sync: {:?}", stats));
    }
    if u64::try_from(stats.latency_samples.len()).ok() != Some(stats.successful_requests) {
        return Err(format!(
            "{} samples for {} successes",
            stats.latency_samples.len(),
            stats.successful_requests
        ));
    }
    if stats.failures_by_kind.total() != stats.failed_requests {
        return Err(format!("Failure kinds out of sync: {:?}", stats));
    }
    Ok(())
}

fn expect_rejected(config: &RunConfig, field: &str) -> Result<(), String> {
    let engine = Engine::new();
    match engine.start(config) {
        Err(AppError::Validation(err)) if err.field() == field => {}
        Err(err) => return Err(format!("Unexpected error for {}: {}", field, err)),
        Ok(handle) => return Err(format!("Run {} started for invalid {}", handle.id(), field)),
    }
    if engine.state() != RunState::Rejected {
        return Err(format!("Expected Rejected, got {:?}", engine.state()));
    }
    if engine.active().is_some() {
        return Err("Rejected start must not leave an active run".to_owned());
    }
    Ok(())
}

#[test]
fn zero_concurrency_is_rejected() -> Result<(), String> {
    expect_rejected(&fast_config("http://127.0.0.1:9/", 0, 1), "concurrency")
}

#[test]
fn zero_duration_is_rejected() -> Result<(), String> {
    expect_rejected(&fast_config("http://127.0.0.1:9/", 1, 0), "duration_seconds")
}

#[test]
fn zero_timeout_is_rejected() -> Result<(), String> {
    let config = RunConfig {
        request_timeout: Duration::ZERO,
        ..fast_config("http://127.0.0.1:9/", 1, 1)
    };
    expect_rejected(&config, "request_timeout")
}

#[test]
fn inverted_delay_range_is_rejected() -> Result<(), String> {
    let config = RunConfig {
        delay_range: DelayRange {
            min: Duration::from_millis(300),
            max: Duration::from_millis(100),
        },
        ..fast_config("http://127.0.0.1:9/", 1, 1)
    };
    expect_rejected(&config, "inter_request_delay_range")
}

#[test]
fn bad_proxy_is_rejected() -> Result<(), String> {
    let config = RunConfig {
        proxy: Some("socks9://proxy".to_owned()),
        ..fast_config("http://127.0.0.1:9/", 1, 1)
    };
    expect_rejected(&config, "proxy")
}

#[test]
fn url_errors_are_distinguished() -> Result<(), String> {
    let cases = [
        ("", "missing"),
        ("   ", "missing"),
        ("not a url", "invalid"),
        ("ftp://example.test/", "scheme"),
    ];
    for (raw, expected) in cases {
        let result = fast_config(raw, 1, 1).validate();
        let matched = matches!(
            (&result, expected),
            (Err(ValidationError::MissingUrl), "missing")
                | (Err(ValidationError::InvalidUrl { .. }), "invalid")
                | (Err(ValidationError::UnsupportedScheme { .. }), "scheme")
        );
        if !matched {
            return Err(format!("{:?}: expected {}, got {:?}", raw, expected, result));
        }
        if let Err(err) = result
            && err.field() != "target_url"
        {
            return Err(format!("{:?}: wrong field {}", raw, err.field()));
        }
    }
    Ok(())
}

#[test]
fn valid_config_produces_plan() -> Result<(), String> {
    let config = RunConfig {
        proxy: Some("http://127.0.0.1:8080".to_owned()),
        ..fast_config("https://example.test/path", 4, 3)
    };
    let plan = config.validate().map_err(|err| err.to_string())?;
    if plan.url().as_str() != "https://example.test/path"
        || plan.concurrency() != 4
        || plan.duration() != Duration::from_secs(3)
        || plan.proxy().map(|url| url.port()) != Some(Some(8080))
    {
        return Err(format!("Unexpected plan: {:?}", plan));
    }
    Ok(())
}

#[test]
fn start_outside_runtime_fails() -> Result<(), String> {
    let engine = Engine::new();
    match engine.start(&fast_config("http://127.0.0.1:9/", 1, 1)) {
        Err(AppError::Engine(EngineError::NoRuntime)) => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(_) => return Err("Run started without a runtime".to_owned()),
    }
    if engine.active().is_some() {
        return Err("No run should be active".to_owned());
    }
    Ok(())
}

#[test]
fn delay_range_samples_within_bounds() -> Result<(), String> {
    let range = DelayRange {
        min: Duration::from_millis(100),
        max: Duration::from_millis(300),
    };
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let delay = range.sample(&mut rng);
        if delay < range.min || delay > range.max {
            return Err(format!("Delay out of range: {:?}", delay));
        }
    }
    let fixed = DelayRange {
        min: Duration::from_millis(50),
        max: Duration::from_millis(50),
    };
    if fixed.sample(&mut rng) != Duration::from_millis(50) {
        return Err("Degenerate range must return its bound".to_owned());
    }
    Ok(())
}

#[test]
fn healthy_target_completes_with_successes() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Ok).await?;
        let engine = Engine::new();
        if engine.state() != RunState::Idle {
            return Err(format!("Expected Idle, got {:?}", engine.state()));
        }
        let handle = engine
            .start(&fast_config(&server.url, 10, 2))
            .map_err(|err| err.to_string())?;
        if !handle.is_running() || engine.state() != RunState::Running {
            return Err(format!("Expected Running, got {:?}", handle.state()));
        }

        let mut previous_total = 0;
        for _ in 0..5 {
            sleep(Duration::from_millis(200)).await;
            let live = handle.poll();
            check_invariants(&live)?;
            if live.total_requests < previous_total {
                return Err("Totals went backwards".to_owned());
            }
            previous_total = live.total_requests;
            if live.is_finished() {
                return Err("Live snapshot marked finished".to_owned());
            }
        }

        let stats = wait_for(&handle).await?;
        check_invariants(&stats)?;
        if handle.is_running() || engine.state() != RunState::Completed {
            return Err(format!("Expected Completed, got {:?}", handle.state()));
        }
        if stats.successful_requests == 0 || stats.failed_requests != 0 {
            return Err(format!("Unexpected counters: {:?}", stats.summary()));
        }
        if stats.elapsed() < Duration::from_secs(2) {
            return Err(format!("Run ended early: {:?}", stats.elapsed()));
        }
        let expected = stats.successful_requests as f64 / 2.0;
        let rps = stats.requests_per_sec();
        if rps > expected * 1.05 || rps < expected * 0.6 {
            return Err(format!("RPS {} not close to {}", rps, expected));
        }
        if server.hits() != stats.total_requests {
            return Err(format!(
                "Server saw {} requests, stats recorded {}",
                server.hits(),
                stats.total_requests
            ));
        }

        sleep(Duration::from_millis(200)).await;
        let later = handle.poll();
        if later.total_requests != stats.total_requests
            || (later.requests_per_sec() - rps).abs() > f64::EPSILON
        {
            return Err("Completed stats must be frozen".to_owned());
        }
        Ok(())
    })
}

#[test]
fn hanging_target_yields_only_timeouts() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Hang).await?;
        let engine = Engine::new();
        let config = RunConfig {
            request_timeout: Duration::from_millis(300),
            ..fast_config(&server.url, 3, 1)
        };
        let handle = engine.start(&config).map_err(|err| err.to_string())?;
        let stats = wait_for(&handle).await?;
        check_invariants(&stats)?;
        if stats.successful_requests != 0
            || stats.total_requests == 0
            || stats.failed_requests != stats.total_requests
        {
            return Err(format!("Unexpected counters: {:?}", stats.summary()));
        }
        if stats.failures_by_kind.timeout != stats.failed_requests {
            return Err(format!("Expected timeouts: {:?}", stats.failures_by_kind));
        }
        if stats.latency().is_some() {
            return Err("No latency expected without successes".to_owned());
        }
        Ok(())
    })
}

#[test]
fn error_statuses_count_as_completed_requests() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Status(500)).await?;
        let engine = Engine::new();
        let handle = engine
            .start(&fast_config(&server.url, 2, 1))
            .map_err(|err| err.to_string())?;
        let stats = wait_for(&handle).await?;
        if stats.successful_requests == 0 || stats.failed_requests != 0 {
            return Err(format!("Unexpected counters: {:?}", stats.summary()));
        }
        Ok(())
    })
}

#[test]
fn completes_within_time_bound() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Ok).await?;
        let engine = Engine::new();
        let config = RunConfig {
            delay_range: DelayRange {
                min: Duration::from_millis(100),
                max: Duration::from_millis(300),
            },
            ..fast_config(&server.url, 5, 1)
        };
        let started = Instant::now();
        let handle = engine.start(&config).map_err(|err| err.to_string())?;
        wait_for(&handle).await?;
        let bound = Duration::from_secs(1)
            .saturating_add(Duration::from_millis(300))
            .saturating_add(config.request_timeout);
        if started.elapsed() > bound {
            return Err(format!("Run took {:?}, bound {:?}", started.elapsed(), bound));
        }
        if started.elapsed() < Duration::from_secs(1) {
            return Err(format!("Run ended early: {:?}", started.elapsed()));
        }
        Ok(())
    })
}

#[test]
fn cancel_stops_run_early_and_is_idempotent() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Ok).await?;
        let engine = Engine::new();
        let started = Instant::now();
        let handle = engine
            .start(&fast_config(&server.url, 4, 60))
            .map_err(|err| err.to_string())?;
        sleep(Duration::from_millis(300)).await;

        handle.cancel();
        handle.cancel();
        engine.cancel();
        let stats = wait_for(&handle).await?;
        check_invariants(&stats)?;
        if started.elapsed() > Duration::from_secs(5) {
            return Err(format!("Cancel took too long: {:?}", started.elapsed()));
        }
        if stats.total_requests == 0 || !stats.is_finished() {
            return Err(format!("Unexpected final stats: {:?}", stats.summary()));
        }

        handle.cancel();
        if handle.state() != RunState::Completed || handle.is_superseded() {
            return Err(format!("Unexpected state after cancel: {:?}", handle.state()));
        }
        if handle.poll().total_requests != stats.total_requests {
            return Err("Late cancel changed the stats".to_owned());
        }
        let again = handle.wait().await.map_err(|err| err.to_string())?;
        if again.total_requests != stats.total_requests {
            return Err("Second wait returned different stats".to_owned());
        }
        Ok(())
    })
}

#[test]
fn new_start_supersedes_running_run() -> Result<(), String> {
    run_async_test(async {
        let first_server = spawn_test_server(ServerBehavior::Ok).await?;
        let second_server = spawn_test_server(ServerBehavior::Ok).await?;
        let engine = Engine::new();

        let first = engine
            .start(&fast_config(&first_server.url, 3, 60))
            .map_err(|err| err.to_string())?;
        sleep(Duration::from_millis(300)).await;
        let second = engine
            .start(&fast_config(&second_server.url, 3, 2))
            .map_err(|err| err.to_string())?;
        if first.id() == second.id() {
            return Err("Runs must get distinct ids".to_owned());
        }

        let first_stats = wait_for(&first).await?;
        if !first.is_superseded() || first.state() != RunState::Completed {
            return Err(format!("First run not superseded: {:?}", first.state()));
        }
        if engine.active().map(|handle| handle.id()) != Some(second.id()) {
            return Err("Engine should track the second run".to_owned());
        }

        let second_before = second.poll().total_requests;
        let first_hits = first_server.hits();
        sleep(Duration::from_millis(400)).await;
        if first.poll().total_requests != first_stats.total_requests {
            return Err("Superseded run kept counting".to_owned());
        }
        if first_server.hits() != first_hits {
            return Err("Superseded run kept sending".to_owned());
        }
        if second.poll().total_requests <= second_before {
            return Err("Second run did not advance".to_owned());
        }

        let second_stats = wait_for(&second).await?;
        if second.is_superseded() || second_stats.successful_requests == 0 {
            return Err(format!("Unexpected second run: {:?}", second_stats.summary()));
        }
        Ok(())
    })
}

#[test]
fn rejected_start_keeps_active_run() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Ok).await?;
        let engine = Engine::new();
        let handle = engine
            .start(&fast_config(&server.url, 2, 60))
            .map_err(|err| err.to_string())?;

        if engine.start(&fast_config(&server.url, 0, 1)).is_ok() {
            return Err("Invalid config was accepted".to_owned());
        }
        if handle.is_superseded() || engine.state() != RunState::Running {
            return Err(format!("Active run disturbed: {:?}", engine.state()));
        }

        engine.cancel();
        wait_for(&handle).await?;
        if engine.state() != RunState::Completed {
            return Err(format!("Expected Completed, got {:?}", engine.state()));
        }
        Ok(())
    })
}

#[test]
fn post_runs_send_sized_payloads() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Ok).await?;
        let engine = Engine::new();
        let config = RunConfig {
            method: HttpMethod::Post,
            body_size: 64,
            ..fast_config(&server.url, 2, 1)
        };
        let handle = engine.start(&config).map_err(|err| err.to_string())?;
        let stats = wait_for(&handle).await?;
        if stats.successful_requests == 0 {
            return Err(format!("No successes: {:?}", stats.summary()));
        }
        if server.body_bytes() != server.hits().saturating_mul(64) {
            return Err(format!(
                "Server saw {} body bytes over {} requests",
                server.body_bytes(),
                server.hits()
            ));
        }
        Ok(())
    })
}

#[test]
fn cancel_records_every_in_flight_request() -> Result<(), String> {
    run_async_test(async {
        const WORKERS: u64 = 4;
        let stall = Duration::from_millis(800);
        let server = spawn_test_server(ServerBehavior::SlowBody(stall)).await?;
        let engine = Engine::new();
        let config = RunConfig {
            request_timeout: Duration::from_secs(5),
            ..fast_config(&server.url, 4, 60)
        };
        let handle = engine.start(&config).map_err(|err| err.to_string())?;

        timeout(Duration::from_secs(2), async {
            while server.hits() < WORKERS {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_err| format!("Only {} workers reached the server", server.hits()))?;
        if handle.progress().total_requests != 0 {
            return Err("Requests finished before the stall ended".to_owned());
        }

        handle.cancel();
        let stats = wait_for(&handle).await?;
        check_invariants(&stats)?;
        if stats.total_requests != WORKERS || server.hits() != WORKERS {
            return Err(format!(
                "Expected {} recorded requests, got {} (server saw {})",
                WORKERS,
                stats.total_requests,
                server.hits()
            ));
        }
        if stats.successful_requests != WORKERS {
            return Err(format!("In-flight requests were abandoned: {:?}", stats.summary()));
        }
        if stats.latency_samples.iter().any(|latency| *latency < stall) {
            return Err(format!("Latency shorter than the stall: {:?}", stats.latency_samples));
        }
        Ok(())
    })
}

#[test]
fn completed_run_is_not_marked_superseded() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Ok).await?;
        let engine = Engine::new();
        let first = engine
            .start(&fast_config(&server.url, 1, 1))
            .map_err(|err| err.to_string())?;
        let first_stats = wait_for(&first).await?;

        let second = engine
            .start(&fast_config(&server.url, 1, 1))
            .map_err(|err| err.to_string())?;
        if first.is_superseded() {
            return Err("A finished run must not be marked superseded".to_owned());
        }
        if first.poll().total_requests != first_stats.total_requests {
            return Err("Finished run changed after a new start".to_owned());
        }
        second.cancel();
        wait_for(&second).await?;
        Ok(())
    })
}

#[test]
fn progress_matches_full_snapshot_counters() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_test_server(ServerBehavior::Ok).await?;
        let engine = Engine::new();
        let handle = engine
            .start(&fast_config(&server.url, 2, 1))
            .map_err(|err| err.to_string())?;
        let stats = wait_for(&handle).await?;
        let progress = handle.progress();
        if progress.total_requests != stats.total_requests
            || progress.successful_requests != stats.successful_requests
            || progress.failed_requests != stats.failed_requests
            || !progress.is_finished()
            || progress.elapsed() != stats.elapsed()
        {
            return Err(format!("Progress {:?} disagrees with final stats", progress));
        }
        Ok(())
    })
}
