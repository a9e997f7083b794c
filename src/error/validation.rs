use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing URL (set --url or provide in config).")]
    MissingUrl,
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}'. Use http or https.")]
    UnsupportedScheme { scheme: String },
    #[error("URL is missing host.")]
    UrlMissingHost,
    #[error("Concurrency must be > 0.")]
    ConcurrencyZero,
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Request timeout must be > 0.")]
    TimeoutZero,
    #[error("Invalid proxy '{url}': {reason}")]
    InvalidProxy { url: String, reason: String },
    #[error("Delay range minimum must be <= maximum.")]
    DelayRangeInverted,
    #[error("Invalid header name '{header}': {source}")]
    InvalidHeaderName {
        header: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("Invalid header value for '{header}': {source}")]
    InvalidHeaderValue {
        header: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid HTTP method '{value}'. Use get, post, or head.")]
    InvalidMethod { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
}

impl ValidationError {
    /// Name of the run configuration field this error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingUrl
            | ValidationError::InvalidUrl { .. }
            | ValidationError::UnsupportedScheme { .. }
            | ValidationError::UrlMissingHost => "target_url",
            ValidationError::ConcurrencyZero => "concurrency",
            ValidationError::DurationZero => "duration_seconds",
            ValidationError::TimeoutZero => "request_timeout",
            ValidationError::InvalidProxy { .. } => "proxy",
            ValidationError::DelayRangeInverted => "inter_request_delay_range",
            ValidationError::InvalidHeaderName { .. }
            | ValidationError::InvalidHeaderValue { .. }
            | ValidationError::InvalidHeaderFormat { .. } => "headers",
            ValidationError::InvalidMethod { .. } => "method",
            ValidationError::DurationEmpty
            | ValidationError::InvalidDurationFormat { .. }
            | ValidationError::InvalidDurationNumber { .. }
            | ValidationError::DurationOverflow
            | ValidationError::InvalidDurationUnit { .. } => "duration",
        }
    }
}
