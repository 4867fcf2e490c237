use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Connect and read timeouts for the calendar request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response bodies larger than this are rejected (1MB).
const MAX_FEED_SIZE: usize = 1024 * 1024;

/// Authorization scheme tag expected by the calendar service.
const AUTH_SCHEME: &str = "GoogleLogin auth=";

/// Errors that can occur while fetching the calendar feed.
///
/// Note that a non-2xx HTTP status is NOT an error at this layer: the body is
/// handed to the parser either way, and a malformed error body surfaces as a
/// parse failure downstream.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, protocol).
    #[error("Request failed: {0}")]
    Network(reqwest::Error),
    /// Request exceeded the connect or read timeout.
    #[error("Request timed out after {}s", REQUEST_TIMEOUT.as_secs())]
    Timeout,
    /// Response body exceeded the size limit.
    #[error("Response too large (exceeds {MAX_FEED_SIZE} bytes)")]
    ResponseTooLarge,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e)
        }
    }
}

/// Build the shared HTTP client with bounded connect/read timeouts.
///
/// Connections are pooled inside the client; no handle outlives a call.
pub fn client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(REQUEST_TIMEOUT)
        .read_timeout(REQUEST_TIMEOUT)
        .build()
}

/// Fetch the raw feed body for the given query URL.
///
/// The auth token is attached as `Authorization: GoogleLogin auth=<token>`
/// with the token form-urlencoded. The body is returned on ANY HTTP status —
/// the status is logged, not treated as failure here.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: Url,
    token: &SecretString,
) -> Result<Vec<u8>, FetchError> {
    let encoded: String = url::form_urlencoded::byte_serialize(token.expose_secret().as_bytes())
        .collect();

    tracing::debug!(url = %url, "Querying calendar feed");
    let response = client
        .get(url)
        .header("Authorization", format!("{AUTH_SCHEME}{encoded}"))
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        tracing::debug!(status = %status, "Calendar feed response");
    } else {
        // Still read the body; the parser decides whether it is usable
        tracing::warn!(status = %status, "Calendar feed returned non-success status");
    }

    read_limited_bytes(response, MAX_FEED_SIZE).await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
