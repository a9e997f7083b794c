use clap::Parser;
use std::time::Duration;

use crate::engine::{DelayRange, RunConfig};

use super::defaults::{DEFAULT_BODY_SIZE, DEFAULT_CONCURRENCY, DEFAULT_DURATION_SECS};
use super::parsers::{parse_delay_arg, parse_duration_arg, parse_header};
use super::types::HttpMethod;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Time-boxed async HTTP load generator - a fixed worker pool hammering one target, with live statistics."
)]
pub struct TesterArgs {
    /// Target URL for the load test (http or https)
    #[arg(long, short)]
    pub url: Option<String>,

    /// HTTP method to use
    #[arg(long, short = 'X', default_value = "get", ignore_case = true)]
    pub method: HttpMethod,

    /// Number of concurrent workers
    #[arg(long, short = 'c', alias = "threads", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Duration of the run (seconds)
    #[arg(long = "duration", short = 't', default_value_t = DEFAULT_DURATION_SECS)]
    pub target_duration: u64,

    /// Route requests through an HTTP proxy (http://host:port)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", default_value = "10s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Lower bound of the randomized pause between requests of one worker
    #[arg(long = "delay-min", default_value = "100ms", value_parser = parse_delay_arg)]
    pub delay_min: Duration,

    /// Upper bound of the randomized pause between requests of one worker
    #[arg(long = "delay-max", default_value = "300ms", value_parser = parse_delay_arg)]
    pub delay_max: Duration,

    /// Extra HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Size of the random payload sent with POST requests (bytes)
    #[arg(long = "body-size", default_value_t = DEFAULT_BODY_SIZE)]
    pub body_size: usize,

    /// Seed for user-agent selection, pacing and payloads
    #[arg(long)]
    pub seed: Option<u64>,

    /// How often live statistics are printed (supports ms/s/m/h)
    #[arg(long = "stats-interval", default_value = "1s", value_parser = parse_duration_arg)]
    pub stats_interval: Duration,

    /// Path to config file (TOML/JSON). Defaults to ./surge.toml or ./surge.json if present.
    #[arg(long)]
    pub config: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by SURGE_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored progress output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl TesterArgs {
    /// Builds the engine configuration. Nothing is validated here; the engine
    /// rejects bad values when the run starts.
    #[must_use]
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            target_url: self.url.clone().unwrap_or_default(),
            method: self.method,
            concurrency: self.concurrency,
            duration_secs: self.target_duration,
            proxy: self.proxy.clone(),
            request_timeout: self.request_timeout,
            delay_range: DelayRange {
                min: self.delay_min,
                max: self.delay_max,
            },
            headers: self.headers.clone(),
            body_size: self.body_size,
            seed: self.seed,
        }
    }
}
