use std::time::Duration;

use reqwest::{Client, Proxy, Url};
use tracing::error;

use crate::error::HttpError;

/// Builds the client shared by every worker of a run.
///
/// Certificate and hostname verification are switched off on purpose: the
/// targets of a load run are frequently self-signed or addressed by IP. Do not
/// reuse this client for anything that must trust its peer.
///
/// # Errors
///
/// Returns an error when the proxy or the client cannot be configured.
pub(crate) fn build_client(proxy: Option<&Url>, request_timeout: Duration) -> Result<Client, HttpError> {
    let mut client_builder = Client::builder()
        .timeout(request_timeout)
        .connect_timeout(request_timeout)
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true);

    if let Some(proxy_url) = proxy {
        let proxy = Proxy::all(proxy_url.as_str()).map_err(|err| {
            error!("Invalid proxy URL '{}': {}", proxy_url, err);
            HttpError::ProxySetup {
                url: proxy_url.to_string(),
                source: err,
            }
        })?;
        client_builder = client_builder.proxy(proxy);
    } else {
        client_builder = client_builder.no_proxy();
    }

    client_builder.build().map_err(|err| {
        error!("Failed to build HTTP client: {}", err);
        HttpError::BuildClientFailed { source: err }
    })
}
