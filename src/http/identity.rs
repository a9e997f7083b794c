//! Browser-like request identities.
//!
//! Every request gets a user agent drawn uniformly from [`USER_AGENTS`] plus a
//! fixed set of browser headers. Output depends only on the RNG handed in, so
//! a seeded RNG yields a reproducible header sequence.

use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, HeaderMap, HeaderName,
    HeaderValue, USER_AGENT,
};

use crate::error::ValidationError;

pub const USER_AGENTS: [&str; 8] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (iPad; CPU OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
];

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";
const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate, br";
const CONNECTION_VALUE: &str = "keep-alive";
const CACHE_CONTROL_VALUE: &str = "no-cache";

/// Produces per-request headers. Extra headers override the defaults of the
/// same name.
#[derive(Debug, Clone, Default)]
pub struct IdentityGenerator {
    extra: Vec<(HeaderName, HeaderValue)>,
}

impl IdentityGenerator {
    /// # Errors
    ///
    /// Returns an error when an extra header name or value is not valid HTTP.
    pub fn new(extra: &[(String, String)]) -> Result<Self, ValidationError> {
        let mut parsed = Vec::with_capacity(extra.len());
        for (key, value) in extra {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
                ValidationError::InvalidHeaderName {
                    header: key.clone(),
                    source: err,
                }
            })?;
            let val =
                HeaderValue::from_str(value).map_err(|err| ValidationError::InvalidHeaderValue {
                    header: key.clone(),
                    source: err,
                })?;
            parsed.push((name, val));
        }
        Ok(Self { extra: parsed })
    }

    pub fn user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
        USER_AGENTS
            .as_slice()
            .choose(rng)
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    pub fn headers<R: Rng + ?Sized>(&self, rng: &mut R) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(self.extra.len().saturating_add(6));
        headers.insert(USER_AGENT, HeaderValue::from_static(Self::user_agent(rng)));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
        headers.insert(CONNECTION, HeaderValue::from_static(CONNECTION_VALUE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
        for (name, value) in &self.extra {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

/// Random bytes for a request body.
pub fn random_payload<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Vec<u8> {
    let mut payload = vec![0u8; size];
    rng.fill_bytes(&mut payload);
    payload
}
