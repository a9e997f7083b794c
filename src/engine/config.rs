use std::time::Duration;

use rand::Rng;
use reqwest::Url;

use crate::args::{
    DEFAULT_BODY_SIZE, DEFAULT_CONCURRENCY, DEFAULT_DELAY_MAX, DEFAULT_DELAY_MIN,
    DEFAULT_DURATION_SECS, DEFAULT_REQUEST_TIMEOUT, HttpMethod,
};
use crate::error::ValidationError;
use crate::http::IdentityGenerator;

/// Bounds of the randomized pause a worker takes after each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_DELAY_MIN,
            max: DEFAULT_DELAY_MAX,
        }
    }
}

impl DelayRange {
    /// Draws a delay uniformly from `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Everything needed to start one run. Built by the caller, checked by
/// [`RunConfig::validate`] when the run starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target_url: String,
    pub method: HttpMethod,
    pub concurrency: usize,
    pub duration_secs: u64,
    /// `http://host:port`; `None` connects directly.
    pub proxy: Option<String>,
    pub request_timeout: Duration,
    pub delay_range: DelayRange,
    /// Added to the generated browser headers, overriding same-named ones.
    pub headers: Vec<(String, String)>,
    /// Random payload size for methods that send a body.
    pub body_size: usize,
    /// Fixes user-agent, pacing and payload randomness when set.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            method: HttpMethod::Get,
            concurrency: DEFAULT_CONCURRENCY,
            duration_secs: DEFAULT_DURATION_SECS,
            proxy: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            delay_range: DelayRange::default(),
            headers: Vec::new(),
            body_size: DEFAULT_BODY_SIZE,
            seed: None,
        }
    }
}

impl RunConfig {
    #[must_use]
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            ..Self::default()
        }
    }

    /// Checks every field and resolves the URLs and headers.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<RunPlan, ValidationError> {
        let url = parse_target_url(&self.target_url)?;
        if self.concurrency == 0 {
            return Err(ValidationError::ConcurrencyZero);
        }
        if self.duration_secs == 0 {
            return Err(ValidationError::DurationZero);
        }
        if self.request_timeout.is_zero() {
            return Err(ValidationError::TimeoutZero);
        }
        if self.delay_range.min > self.delay_range.max {
            return Err(ValidationError::DelayRangeInverted);
        }
        let proxy = self.proxy.as_deref().map(parse_proxy_url).transpose()?;
        let identity = IdentityGenerator::new(&self.headers)?;

        Ok(RunPlan {
            url,
            method: self.method,
            concurrency: self.concurrency,
            duration: Duration::from_secs(self.duration_secs),
            proxy,
            request_timeout: self.request_timeout,
            delay_range: self.delay_range,
            identity,
            body_size: self.body_size,
            seed: self.seed,
        })
    }
}

/// A run configuration that passed validation.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub(crate) url: Url,
    pub(crate) method: HttpMethod,
    pub(crate) concurrency: usize,
    pub(crate) duration: Duration,
    pub(crate) proxy: Option<Url>,
    pub(crate) request_timeout: Duration,
    pub(crate) delay_range: DelayRange,
    pub(crate) identity: IdentityGenerator,
    pub(crate) body_size: usize,
    pub(crate) seed: Option<u64>,
}

impl RunPlan {
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub const fn proxy(&self) -> Option<&Url> {
        self.proxy.as_ref()
    }
}

fn parse_target_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    let url = Url::parse(trimmed).map_err(|err| ValidationError::InvalidUrl {
        url: trimmed.to_owned(),
        source: err,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            scheme: url.scheme().to_owned(),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::UrlMissingHost);
    }
    Ok(url)
}

fn parse_proxy_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ValidationError::InvalidProxy {
        url: raw.to_owned(),
        reason,
    };
    if trimmed.is_empty() {
        return Err(invalid("proxy must not be empty".to_owned()));
    }
    let url = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "unsupported scheme '{}', expected http://host:port",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(url)
}
