use crate::episode::Episode;
use crate::feed::parser::{parse_feed_xml, ParseError};
use crate::feed::proxy::{parse_proxy_response, FEED_URL_PARAM};
use crate::util::{validate_feed_url, UrlValidationError};
use futures::StreamExt;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors from a single retrieval attempt (direct feed or proxy).
///
/// On the direct path every variant is recoverable: the fetcher moves on to
/// the proxy. On the proxy path every variant is terminal.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The feed URL is not an absolute http(s) URL
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[source] UrlValidationError),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Feed XML was not well-formed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// Proxy body was not the expected JSON object
    #[error("Invalid JSON from feed proxy: {0}")]
    Json(#[from] serde_json::Error),
    /// Proxy JSON had no `items` array
    #[error("Feed proxy response has no items")]
    MissingItems,
    /// The payload parsed but contained no episodes
    #[error("Feed contains no episodes")]
    NoEpisodes,
    /// The configured proxy endpoint is not a usable URL
    #[error("Invalid feed proxy endpoint: {0}")]
    InvalidEndpoint(#[source] UrlValidationError),
}

/// Terminal failure of the fetch stage.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Both the direct fetch and the proxy fallback failed.
    #[error("Feed unavailable: fallback failed ({fallback}) after direct fetch failed ({primary})")]
    Unavailable {
        primary: FetchError,
        fallback: FetchError,
    },
}

/// Fetches and parses a feed, falling back to a feed-to-JSON proxy.
///
/// The direct request carries no cookies or credentials (the client has no
/// cookie store). If it fails for any reason, including a feed URL that is
/// not http(s) or a well-formed feed with zero items, the proxy at `fallback_endpoint` is asked for the same
/// feed via the `rss_url` query parameter. The two requests are strictly
/// sequential.
///
/// # Arguments
///
/// * `client` - HTTP client (caller controls configuration)
/// * `feed_url` - URL of the RSS feed
/// * `fallback_endpoint` - Base URL of the feed-to-JSON proxy
///
/// # Returns
///
/// A non-empty `Vec` of episodes in feed order (unsorted).
///
/// # Errors
///
/// - [`FeedError::Unavailable`] - both paths failed; carries both causes
///
/// # Behavior
///
/// - No retries beyond the single fallback
/// - No explicit timeout (reqwest defaults apply)
/// - Response bodies are limited to 10MB
pub async fn fetch_episodes(
    client: &reqwest::Client,
    feed_url: &str,
    fallback_endpoint: &str,
) -> Result<Vec<Episode>, FeedError> {
    let feed_url = feed_url.trim();

    let primary = match fetch_direct(client, feed_url).await {
        Ok(episodes) => {
            tracing::debug!(feed = %feed_url, episodes = episodes.len(), "Fetched feed directly");
            return Ok(episodes);
        }
        Err(e) => e,
    };

    tracing::warn!(
        feed = %feed_url,
        error = %primary,
        "Direct feed fetch failed, trying feed proxy"
    );

    match fetch_via_proxy(client, fallback_endpoint, feed_url).await {
        Ok(episodes) => {
            tracing::info!(
                feed = %feed_url,
                episodes = episodes.len(),
                "Fetched feed through proxy"
            );
            Ok(episodes)
        }
        Err(fallback) => Err(FeedError::Unavailable { primary, fallback }),
    }
}

async fn fetch_direct(client: &reqwest::Client, feed_url: &str) -> Result<Vec<Episode>, FetchError> {
    let feed_url = validate_feed_url(feed_url).map_err(FetchError::InvalidUrl)?;
    let response = client.get(feed_url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    let text = String::from_utf8_lossy(&bytes);
    let episodes = parse_feed_xml(&text)?;

    if episodes.is_empty() {
        return Err(FetchError::NoEpisodes);
    }
    Ok(episodes)
}

async fn fetch_via_proxy(
    client: &reqwest::Client,
    endpoint: &str,
    feed_url: &str,
) -> Result<Vec<Episode>, FetchError> {
    let mut proxy_url = validate_feed_url(endpoint).map_err(FetchError::InvalidEndpoint)?;
    proxy_url
        .query_pairs_mut()
        .append_pair(FEED_URL_PARAM, feed_url);

    let response = client.get(proxy_url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    let episodes = parse_proxy_response(&bytes)?;

    if episodes.is_empty() {
        return Err(FetchError::NoEpisodes);
    }
    Ok(episodes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // EDGE-005: a dropped connection can end the stream early without an error
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
