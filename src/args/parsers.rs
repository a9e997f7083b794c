use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once(':') {
        Some((key, value)) => Ok((key.trim().to_owned(), value.trim().to_owned())),
        None => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

/// Parses a duration with an optional `ms`/`s`/`m`/`h` suffix; must be > 0.
pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    let duration = parse_duration_allow_zero(s)?;
    if duration.is_zero() {
        return Err(AppError::validation(ValidationError::DurationZero));
    }
    Ok(duration)
}

/// Same grammar as [`parse_duration_arg`], but `0` is accepted (pacing delays).
pub(crate) fn parse_delay_arg(s: &str) -> AppResult<Duration> {
    parse_duration_allow_zero(s)
}

fn parse_duration_allow_zero(s: &str) -> AppResult<Duration> {
    let value = s.trim();
    if value.is_empty() {
        return Err(AppError::validation(ValidationError::DurationEmpty));
    }

    let number_len = value
        .chars()
        .take_while(|ch| ch.is_ascii_digit() || *ch == '.')
        .count();
    if number_len == 0 {
        return Err(AppError::validation(
            ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            },
        ));
    }
    let (num_part, unit_part) = value.split_at(number_len);
    if num_part.contains('.') {
        return parse_fractional(value, num_part, unit_part);
    }
    let number: u64 = num_part.parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })
    })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => {
            let secs = number
                .checked_mul(60)
                .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))?;
            Duration::from_secs(secs)
        }
        "h" => {
            let secs = number
                .checked_mul(60)
                .and_then(|seconds| seconds.checked_mul(60))
                .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(AppError::validation(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            }));
        }
    };

    Ok(duration)
}

/// Decimal amounts such as `0.1` (seconds) or `1.5m`.
fn parse_fractional(value: &str, num_part: &str, unit_part: &str) -> AppResult<Duration> {
    let number: f64 = num_part.parse().map_err(|_err| {
        AppError::validation(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        })
    })?;
    let unit_secs = match unit_part {
        "ms" => 0.001,
        "" | "s" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        _ => {
            return Err(AppError::validation(ValidationError::InvalidDurationUnit {
                unit: unit_part.to_owned(),
            }));
        }
    };
    Duration::try_from_secs_f64(number * unit_secs)
        .map_err(|_err| AppError::validation(ValidationError::DurationOverflow))
}
