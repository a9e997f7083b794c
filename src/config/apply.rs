use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{TesterArgs, parse_header};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Values given explicitly on
/// the command line are kept.
///
/// # Errors
///
/// Returns an error when a config value cannot be converted.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method
    {
        args.method = method;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = concurrency;
    }

    if !is_cli(matches, "target_duration")
        && let Some(duration) = config.duration
    {
        args.target_duration = duration;
    }

    if !is_cli(matches, "proxy")
        && let Some(proxy) = config.proxy.clone()
    {
        args.proxy = Some(proxy);
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = timeout.to_duration("timeout")?;
    }

    if !is_cli(matches, "delay_min")
        && let Some(delay) = config.delay_min.as_ref()
    {
        args.delay_min = delay.to_delay("delay_min")?;
    }

    if !is_cli(matches, "delay_max")
        && let Some(delay) = config.delay_max.as_ref()
    {
        args.delay_max = delay.to_delay("delay_max")?;
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            let pair = parse_header(header).map_err(|_err| {
                AppError::config(ConfigError::InvalidHeader {
                    value: header.clone(),
                })
            })?;
            parsed.push(pair);
        }
        args.headers = parsed;
    }

    if !is_cli(matches, "body_size")
        && let Some(body_size) = config.body_size
    {
        args.body_size = body_size;
    }

    if !is_cli(matches, "seed")
        && let Some(seed) = config.seed
    {
        args.seed = Some(seed);
    }

    if !is_cli(matches, "stats_interval")
        && let Some(interval) = config.stats_interval.as_ref()
    {
        args.stats_interval = interval.to_duration("stats_interval")?;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    if !is_cli(matches, "json")
        && let Some(json) = config.json
    {
        args.json = json;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), Some(ValueSource::CommandLine))
}
