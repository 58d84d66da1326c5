use crate::feed::parser::{parse_feed, ParseError, RawFeed};
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_REDIRECTS: usize = 5;
const USER_AGENT: &str = concat!("goodreads-cleaner/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while fetching the source feed.
///
/// Every variant is fatal to the run: nothing here is retried, the next
/// scheduled run is the retry.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured source URL is not an absolute http(s) URL.
    #[error("Invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Feed XML could not be parsed as RSS or Atom
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Builds the HTTP client used for the fetch.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Validates the source URL and optionally appends a cache-busting parameter.
///
/// Goodreads serves the updates feed through a CDN that can hold stale copies
/// for a long time; `nocache=<stamp>` forces a fresh response.
pub fn source_url(raw: &str, cache_bust: Option<i64>) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported scheme '{}'", scheme))),
    }

    if let Some(stamp) = cache_bust {
        url.query_pairs_mut()
            .append_pair("nocache", &stamp.to_string());
    }

    Ok(url)
}

/// Fetches and parses the source feed.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection or TLS errors
/// - [`FetchError::Timeout`] - Request exceeded the client timeout
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
/// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
/// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
/// - [`FetchError::Parse`] - Invalid RSS/Atom XML
pub async fn fetch(client: &reqwest::Client, url: &Url) -> Result<RawFeed, FetchError> {
    tracing::debug!(url = %url, "Fetching source feed");

    let response = client.get(url.clone()).send().await.map_err(map_send_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    tracing::debug!(bytes = bytes.len(), "Source feed downloaded");

    let feed = parse_feed(&bytes)?;
    Ok(feed)
}

fn map_send_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_send_error)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
