//! HTTP client construction and request helpers.
//!
//! One client per process run, injected into the fetch path. Source sites
//! commonly require a referer on asset requests, so every helper takes an
//! optional referer to attach.

use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, REFERER};
use tracing::debug;
use url::Url;

use crate::error::DownloadError;

const USER_AGENT: &str = concat!("artfetch/", env!("CARGO_PKG_VERSION"));

/// Build the process-wide HTTP client.
pub fn build_client() -> Result<Client, DownloadError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DownloadError::ClientBuild(e.to_string()))
}

/// Ask the source for the payload size with a HEAD request.
///
/// Returns `Ok(None)` when the server answers without a usable
/// `Content-Length`; transport and HTTP-status failures are real errors.
pub async fn probe_content_length(
    client: &Client,
    url: &str,
    referer: Option<&str>,
) -> Result<Option<u64>, DownloadError> {
    let parsed = parse_url(url)?;
    let mut request = client.head(parsed);
    if let Some(referer) = referer {
        request = request.header(REFERER, referer);
    }

    let response = request
        .send()
        .await
        .map_err(|e| DownloadError::network(url, e.to_string()))?;
    if !response.status().is_success() {
        return Err(DownloadError::Network {
            url: url.to_string(),
            message: format!("HEAD request failed: {}", response.status()),
            status_code: Some(response.status().as_u16()),
        });
    }

    let length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    debug!(url, ?length, "probed declared size");
    Ok(length)
}

/// Open the payload stream with a GET request.
pub async fn open_stream(
    client: &Client,
    url: &str,
    referer: Option<&str>,
) -> Result<reqwest::Response, DownloadError> {
    let parsed = parse_url(url)?;
    let mut request = client.get(parsed);
    if let Some(referer) = referer {
        debug!(url, referer, "using referer");
        request = request.header(REFERER, referer);
    }

    let response = request
        .send()
        .await
        .map_err(|e| DownloadError::network(url, e.to_string()))?;
    if !response.status().is_success() {
        return Err(DownloadError::Network {
            url: url.to_string(),
            message: format!("GET request failed: {}", response.status()),
            status_code: Some(response.status().as_u16()),
        });
    }
    Ok(response)
}

fn parse_url(url: &str) -> Result<Url, DownloadError> {
    Url::parse(url).map_err(|_| DownloadError::InvalidUrl(url.to_string()))
}
