use crate::core::FetchError;
use std::time::Duration;
use tracing::debug;

pub const CLIENT_USER_AGENT: &str = "findash/0.1";

/// Builds an HTTP client with a hard timeout covering connect, send and body read.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {e}")))
}

/// GETs `url` and returns the body text. Transport errors, timeouts and
/// non-success statuses all map to [`FetchError::Network`].
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    debug!("Requesting {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network(format!("Request error: {e} for URL: {url}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Network(format!(
            "HTTP error: {status} for URL: {url}"
        )));
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::Network(format!("Failed to read response body from {url}: {e}")))
}
