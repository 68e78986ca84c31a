//! Upstream quote sources.
//!
//! The ingestion loop only depends on the [`QuoteSource`] trait. [`HttpQuoteSource`] is the
//! production implementation: it GETs a JSON array of `{"q": .., "a": ..}` objects.
//!
//! Parsing is lenient. A body that is valid JSON but not an array is an empty
//! batch, and array elements that do not look like quotes are skipped; only transport failures,
//! bad status codes and bodies that are not JSON at all surface as [`FetchError`].

use crate::constants::{RATE_LIMIT_SENTINEL_AUTHOR, USER_AGENT};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// A candidate quote exactly as the upstream delivered it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawQuote {
    #[serde(rename = "q", default)]
    pub text: Option<String>,
    #[serde(rename = "a", default)]
    pub author: Option<String>,
}

impl RawQuote {
    pub fn new(text: Option<&str>, author: Option<&str>) -> Self {
        Self {
            text: text.map(str::to_owned),
            author: author.map(str::to_owned),
        }
    }

    /// True for the placeholder the upstream returns instead of quotes when throttling.
    pub fn is_rate_limit_sentinel(&self) -> bool {
        self.author
            .as_deref()
            .is_some_and(|a| a.trim().eq_ignore_ascii_case(RATE_LIMIT_SENTINEL_AUTHOR))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("request failed: {0}")]
    Request(reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream is rate limiting requests")]
    RateLimited,
    #[error("failed to decode upstream response: {0}")]
    Decode(serde_json::Error),
}

/// Something that can produce a batch of candidate quotes.
///
/// No ordering or uniqueness is promised; callers deduplicate every element.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_batch(&self) -> Result<Vec<RawQuote>, FetchError>;
}

/// Fetches quote batches over HTTP.
#[derive(Debug, Clone)]
pub struct HttpQuoteSource {
    client: Client,
    url: String,
}

impl HttpQuoteSource {
    /// Creates a source for `url`; every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch_batch(&self) -> Result<Vec<RawQuote>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(FetchError::Request)?;
        parse_batch(&body)
    }
}

/// Decode an upstream body into candidate quotes.
///
/// - not JSON: [`FetchError::Decode`]
/// - JSON but not an array: empty batch
/// - array elements that are not `{q, a}` objects: skipped
/// - rate-limit placeholders: dropped; a batch made only of placeholders is
///   [`FetchError::RateLimited`]
pub fn parse_batch(body: &str) -> Result<Vec<RawQuote>, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(FetchError::Decode)?;

    let serde_json::Value::Array(items) = value else {
        tracing::warn!("upstream response is not a JSON array, treating as empty batch");
        return Ok(Vec::new());
    };

    let total = items.len();
    let decoded: Vec<RawQuote> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawQuote>(item).ok())
        .collect();

    if decoded.len() < total {
        tracing::debug!(
            skipped = total - decoded.len(),
            "skipped malformed upstream entries"
        );
    }

    let sentinels = decoded.iter().filter(|q| q.is_rate_limit_sentinel()).count();
    if sentinels > 0 && sentinels == decoded.len() {
        return Err(FetchError::RateLimited);
    }

    Ok(decoded
        .into_iter()
        .filter(|q| !q.is_rate_limit_sentinel())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_of_quotes() {
        let body = r#"[
            {"q": "Be yourself.", "a": "Oscar Wilde", "h": "<blockquote>..</blockquote>"},
            {"q": "Less is more.", "a": "Ludwig Mies van der Rohe"}
        ]"#;
        let batch = parse_batch(body).unwrap();
        assert_eq!(
            batch,
            vec![
                RawQuote::new(Some("Be yourself."), Some("Oscar Wilde")),
                RawQuote::new(Some("Less is more."), Some("Ludwig Mies van der Rohe")),
            ]
        );
    }

    #[test]
    fn missing_fields_decode_as_none() {
        let batch = parse_batch(r#"[{"q": "Only text"}, {}]"#).unwrap();
        assert_eq!(batch[0], RawQuote::new(Some("Only text"), None));
        assert_eq!(batch[1], RawQuote::default());
    }

    #[test]
    fn non_array_json_is_empty_batch() {
        assert!(parse_batch(r#"{"error": "nope"}"#).unwrap().is_empty());
        assert!(parse_batch("null").unwrap().is_empty());
        assert!(parse_batch("\"text\"").unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_decode_error() {
        assert!(matches!(
            parse_batch("<html>bad gateway</html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn malformed_elements_are_skipped() {
        let body = r#"[42, "text", {"q": 7}, {"q": "Kept", "a": "Someone"}]"#;
        let batch = parse_batch(body).unwrap();
        assert_eq!(batch, vec![RawQuote::new(Some("Kept"), Some("Someone"))]);
    }

    #[test]
    fn sentinel_only_batch_is_rate_limited() {
        let body = r#"[{"q": "Too many requests. Obtain an auth key for unlimited access.", "a": "zenquotes.io"}]"#;
        assert!(matches!(parse_batch(body), Err(FetchError::RateLimited)));
    }

    #[test]
    fn sentinel_is_dropped_from_mixed_batch() {
        let body = r#"[{"q": "Too many requests.", "a": "zenquotes.io"}, {"q": "Real", "a": "Author"}]"#;
        let batch = parse_batch(body).unwrap();
        assert_eq!(batch, vec![RawQuote::new(Some("Real"), Some("Author"))]);
    }

    #[test]
    fn empty_array_is_not_rate_limited() {
        assert!(parse_batch("[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let source =
            HttpQuoteSource::new("http://127.0.0.1:9/quotes", Duration::from_millis(500)).unwrap();
        assert!(matches!(
            source.fetch_batch().await,
            Err(FetchError::Request(_))
        ));
    }
}
