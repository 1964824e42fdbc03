use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::record::ListingRecord;

/// The upstream caps a single page at this size, and the whole catalogue fits in one
pub const DEFAULT_PAGE_SIZE: u32 = 500;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keep upstream error bodies from flooding logs and client messages
const MAX_ERROR_BODY_LENGTH: usize = 300;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Upstream API key is not configured")]
    MissingApiKey,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Upstream response is malformed: {0}")]
    MalformedResponse(String),

    /// Always built from an error with its URL stripped, since the URL
    /// carries the API key
    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// A decoded page of the upstream envelope
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub data: Vec<ListingRecord>,
    /// Size of the whole collection, when the upstream reports it
    pub total_count: Option<u64>,
}

pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!("govlist/", env!("CARGO_PKG_VERSION"))),
        );

        // Falls back to a default client if the builder rejects the config,
        // which only happens when the TLS backend fails to initialise
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build configured HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: base_url.into(),
            api_key,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch the full upstream collection as one large page
    pub async fn fetch_all(&self) -> Result<ListingPage> {
        let page = self.fetch_page(1, self.page_size).await?;

        if let Some(total) = page.total_count {
            if total > page.data.len() as u64 {
                warn!(
                    "Upstream reports {} records but a single page returned {}; raise the page size",
                    total,
                    page.data.len()
                );
            }
        }

        Ok(page)
    }

    /// Fetch one page. No retries: a failure here fails the caller's request.
    pub async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ListingPage> {
        // Check the credential before touching the network
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::MissingApiKey)?;

        debug!("Fetching upstream page {} ({} per page)", page, per_page);

        let page = page.to_string();
        let per_page = per_page.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("serviceKey", api_key),
                ("page", page.as_str()),
                ("perPage", per_page.as_str()),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            // Some upstreams echo the request back in their error page
            let body = body.replace(api_key, "[redacted]");
            return Err(ApiError::RequestFailed(format!(
                "Status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        parse_envelope(&body)
    }
}

fn network_error(err: reqwest::Error) -> ApiError {
    ApiError::NetworkError(err.without_url())
}

/// Decode the upstream `{ "data": [...] }` envelope
///
/// A body that isn't JSON is a parse error. JSON without a `data` array is a
/// contract violation and gets its own error so callers can tell them apart.
/// Individual records without a usable id are skipped, not fatal.
pub fn parse_envelope(body: &str) -> Result<ListingPage> {
    let mut value: Value = serde_json::from_str(body)?;

    let total_count = value.get("totalCount").and_then(Value::as_u64);

    let records = match value.get_mut("data").map(Value::take) {
        Some(Value::Array(records)) => records,
        Some(other) => {
            return Err(ApiError::MalformedResponse(format!(
                "expected `data` to be an array, got {}",
                json_kind(&other)
            )))
        }
        None => {
            return Err(ApiError::MalformedResponse(
                "response has no `data` field".to_string(),
            ))
        }
    };

    let mut data = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (index, record) in records.into_iter().enumerate() {
        let decoded = match record {
            Value::Object(map) => ListingRecord::try_from(map),
            other => Err(format!("expected an object, got {}", json_kind(&other))),
        };

        match decoded {
            Ok(record) => data.push(record),
            Err(reason) => {
                skipped += 1;
                debug!("Skipping upstream record {}: {}", index, reason);
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} upstream records that had no usable id", skipped);
    }

    Ok(ListingPage { data, total_count })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }

    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope_keeps_unknown_fields() {
        let body = r#"{
            "page": 1,
            "perPage": 500,
            "totalCount": 2,
            "data": [
                {"id": 1, "name": "Youth Housing", "organizationName": "Ministry of Land",
                 "regionCode": "11", "categoryCode": "A", "applyUrl": "https://example.org/1"},
                {"id": 2, "name": "Startup Grant", "regionCode": "26"}
            ]
        }"#;

        let page = parse_envelope(body).unwrap();
        assert_eq!(page.total_count, Some(2));
        assert_eq!(page.data.len(), 2);

        let first = &page.data[0];
        assert_eq!(first.organization_name(), Some("Ministry of Land"));
        assert_eq!(
            first.get("applyUrl").and_then(Value::as_str),
            Some("https://example.org/1")
        );

        let second = &page.data[1];
        assert_eq!(second.organization_name(), None);
        assert_eq!(second.category_code(), None);
    }

    #[test]
    fn test_parse_envelope_without_data_is_malformed() {
        let err = parse_envelope(r#"{"message": "quota exceeded"}"#).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
        assert!(err.to_string().contains("no `data` field"));
    }

    #[test]
    fn test_parse_envelope_with_non_array_data_is_malformed() {
        let err = parse_envelope(r#"{"data": {"id": 1}}"#).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_envelope_rejects_non_json() {
        let err = parse_envelope("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[test]
    fn test_odd_records_do_not_sink_the_snapshot() {
        let body = r#"{"data": [
            {"id": 1, "name": "ok"},
            {"id": 2, "name": null},
            {"id": 3, "name": "Numeric codes", "regionCode": 11, "categoryCode": 4},
            {"name": "no id"},
            "not an object"
        ]}"#;

        let page = parse_envelope(body).unwrap();
        let ids: Vec<i64> = page.data.iter().map(ListingRecord::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(page.data[1].name(), "");
        assert_eq!(page.data[2].region_code(), Some("11"));
        assert_eq!(page.data[2].category_code(), Some("4"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        // Unroutable URL: if we got as far as sending, this would be a network error
        let client = UpstreamClient::new("http://127.0.0.1:9/listings", None);
        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_blank_api_key_counts_as_missing() {
        let client = UpstreamClient::new("http://127.0.0.1:9/listings", Some("   ".into()));
        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey));
    }

    /// Serve one canned HTTP response on a local port. The handle yields the
    /// raw request the client sent.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/listings", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_fetch_all_sends_key_and_page_size() {
        let (url, server) = serve_once("200 OK", r#"{"totalCount":1,"data":[{"id":1,"name":"a"}]}"#).await;

        let client = UpstreamClient::new(url, Some("s3cret-key".into()));
        let page = client.fetch_all().await.unwrap();
        assert_eq!(page.data.len(), 1);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /listings?serviceKey=s3cret-key&page=1&perPage=500 "));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error_without_key() {
        let client = UpstreamClient::new("http://127.0.0.1:9/listings", Some("s3cret-key".into()));
        let err = client.fetch_all().await.unwrap_err();

        assert!(matches!(err, ApiError::NetworkError(_)));
        let message = err.to_string();
        assert!(!message.contains("s3cret-key"), "key leaked: {}", message);
        assert!(!message.contains("serviceKey"), "url leaked: {}", message);
    }

    #[tokio::test]
    async fn test_error_status_is_request_failed() {
        let (url, _server) = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#).await;

        let client = UpstreamClient::new(url, Some("s3cret-key".into()));
        let err = client.fetch_all().await.unwrap_err();

        assert!(matches!(err, ApiError::RequestFailed(_)));
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("busy"));
    }

    #[tokio::test]
    async fn test_error_body_echoing_key_is_redacted() {
        let (url, _server) =
            serve_once("401 Unauthorized", "invalid serviceKey=s3cret-key").await;

        let client = UpstreamClient::new(url, Some("s3cret-key".into()));
        let message = client.fetch_all().await.unwrap_err().to_string();

        assert!(!message.contains("s3cret-key"));
        assert!(message.contains("[redacted]"));
    }

    #[tokio::test]
    async fn test_success_without_data_is_malformed() {
        let (url, _server) = serve_once("200 OK", r#"{"resultMsg":"quota exceeded"}"#).await;

        let client = UpstreamClient::new(url, Some("s3cret-key".into()));
        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn test_page_size_defaults_and_floor() {
        let client = UpstreamClient::new("http://localhost", None);
        assert_eq!(client.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(client.with_page_size(0).page_size(), 1);
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");

        let long = "é".repeat(MAX_ERROR_BODY_LENGTH);
        let truncated = truncate_body(&long);
        assert!(truncated.contains("bytes total"));
        assert!(truncated.len() < long.len());
    }
}
