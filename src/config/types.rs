use std::time::Duration;

use serde::Deserialize;

use crate::args::HttpMethod;
use crate::args::parsers::{parse_delay_arg, parse_duration_arg};
use crate::error::ConfigError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub method: Option<HttpMethod>,
    #[serde(alias = "threads", alias = "connections")]
    pub concurrency: Option<usize>,
    pub duration: Option<u64>,
    pub proxy: Option<String>,
    pub timeout: Option<DurationValue>,
    pub delay_min: Option<DurationValue>,
    pub delay_max: Option<DurationValue>,
    pub headers: Option<Vec<String>>,
    pub body_size: Option<usize>,
    pub seed: Option<u64>,
    pub stats_interval: Option<DurationValue>,
    pub no_color: Option<bool>,
    pub json: Option<bool>,
}

/// A number of seconds (whole or fractional) or a string with a unit suffix.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Float(f64),
    Text(String),
}

impl DurationValue {
    /// Converts to a non-zero duration.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is zero or cannot be parsed.
    pub(crate) fn to_duration(&self, field: &'static str) -> Result<Duration, ConfigError> {
        let parsed = match self {
            DurationValue::Seconds(secs) => parse_duration_arg(&secs.to_string()),
            DurationValue::Float(secs) => {
                let duration = float_seconds(*secs, field)?;
                if duration.is_zero() {
                    return Err(ConfigError::InvalidDuration {
                        field,
                        message: "must be > 0".to_owned(),
                    });
                }
                return Ok(duration);
            }
            DurationValue::Text(text) => parse_duration_arg(text),
        };
        parsed.map_err(|err| ConfigError::InvalidDuration {
            field,
            message: err.to_string(),
        })
    }

    /// Converts to a pacing delay, where zero is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be parsed.
    pub(crate) fn to_delay(&self, field: &'static str) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Float(secs) => float_seconds(*secs, field),
            DurationValue::Text(text) => {
                parse_delay_arg(text).map_err(|err| ConfigError::InvalidDuration {
                    field,
                    message: err.to_string(),
                })
            }
        }
    }
}

fn float_seconds(secs: f64, field: &'static str) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|err| ConfigError::InvalidDuration {
        field,
        message: err.to_string(),
    })
}
