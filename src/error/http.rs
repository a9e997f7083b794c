use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to configure proxy '{url}': {source}")]
    ProxySetup {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
}
