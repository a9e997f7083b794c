use std::error::Error as StdError;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Url, header::HeaderMap};
use tokio::time::Instant;
use tracing::trace;

use crate::args::HttpMethod;
use crate::error::HttpError;
use crate::metrics::{FailureKind, RequestOutcome};

use super::client::build_client;

/// Issues single requests for a run. Holds no run state; the caller records
/// each outcome.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    request_timeout: Duration,
}

impl RequestExecutor {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built for the given
    /// proxy.
    pub fn new(proxy: Option<&Url>, request_timeout: Duration) -> Result<Self, HttpError> {
        Ok(Self {
            client: build_client(proxy, request_timeout)?,
            request_timeout,
        })
    }

    /// Sends one request and drains the whole response body. Every failure is
    /// folded into the returned outcome.
    pub async fn execute(
        &self,
        url: &Url,
        method: HttpMethod,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> RequestOutcome {
        let mut builder = self
            .client
            .request(method.to_reqwest(), url.clone())
            .headers(headers)
            .timeout(self.request_timeout);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let start = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                let kind = classify_error(&err);
                trace!("Request failed ({}): {}", kind, err);
                return RequestOutcome::failure(kind, None);
            }
        };

        let status = response.status().as_u16();
        match drain_response_body(response).await {
            Ok(bytes) => RequestOutcome::success(start.elapsed(), status, bytes),
            Err(err) => {
                let kind = classify_error(&err);
                trace!("Failed to read response body ({}): {}", kind, err);
                RequestOutcome::failure(kind, Some(status))
            }
        }
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}

pub(crate) fn classify_error(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        return FailureKind::Timeout;
    }
    if mentions_tls(err) {
        return FailureKind::Tls;
    }
    if err.is_connect() || err.is_body() || has_io_source(err) {
        return FailureKind::Network;
    }
    if err.is_request() || err.is_decode() || err.is_redirect() || err.is_status() {
        return FailureKind::Protocol;
    }
    FailureKind::Other
}

fn error_chain(err: &reqwest::Error) -> impl Iterator<Item = &(dyn StdError + 'static)> {
    std::iter::successors(err.source(), |current| (*current).source())
}

fn mentions_tls(err: &reqwest::Error) -> bool {
    error_chain(err).any(|source| {
        let message = source.to_string().to_ascii_lowercase();
        message.contains("tls") || message.contains("ssl") || message.contains("certificate")
    })
}

fn has_io_source(err: &reqwest::Error) -> bool {
    error_chain(err).any(|source| source.is::<std::io::Error>())
}
