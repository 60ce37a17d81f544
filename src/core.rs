use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState,
    state::NotKeyed,
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::sleep;

use super::company::TickerIndex;
use super::config::{EdgarConfig, EdgarUrls};
use super::error::{EdgarError, Result};

const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second
const PREVIEW_CHARS: usize = 200;

type Governor = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// HTTP client for SEC EDGAR with built-in rate limiting, retries and a ticker cache.
///
/// Every request, whichever host it targets, first takes a token from a shared
/// token bucket so the process as a whole never exceeds the configured rate
/// (10 requests per second by default, the SEC fair-access ceiling):
///
/// ```text
/// Token Bucket (capacity: rate_limit tokens)
/// ┌──────────────────────────┐
/// │ ████████████████████████ │  ← Tokens refill at rate_limit/sec
/// └──────────────────────────┘
///      ↓ consume on request
/// ```
///
/// Cloning an `Edgar` is cheap; clones share the bucket, the connection pool and
/// the ticker cache, so concurrent downloads stay within the limit.
///
/// # Error Handling
///
/// HTTP 429 responses and transport failures are retried with exponential backoff
/// and jitter. HTTP 404 becomes [`EdgarError::NotFound`]; other unexpected statuses
/// become [`EdgarError::InvalidResponse`] with a short preview of the body.
///
/// # Examples
///
/// ```rust
/// # use tenk::Edgar;
/// let edgar = Edgar::new("Jane Doe jane@example.com")?;
/// # Ok::<(), tenk::EdgarError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Edgar {
    /// HTTP client for making requests
    pub(crate) client: reqwest::Client,

    /// Token bucket rate limiter for SEC compliance
    pub(crate) rate_limiter: Arc<Governor>,

    /// Base URL for EDGAR archives
    pub(crate) edgar_archives_url: String,

    /// Base URL for EDGAR data API
    pub(crate) edgar_data_url: String,

    /// Base URL for EDGAR files
    pub(crate) edgar_files_url: String,

    /// sec-api.io query endpoint
    pub(crate) sec_api_url: String,

    pub(crate) sec_api_key: Option<String>,

    /// `company_tickers.json`, fetched at most once per client
    pub(crate) tickers: Arc<OnceCell<TickerIndex>>,
}

impl Edgar {
    /// Creates a client with SEC defaults: 10 requests per second, a 30 second
    /// timeout and the public SEC.gov base URLs.
    ///
    /// `user_agent` must identify you with a name and contact email, e.g.
    /// `"Sample Company admin@sample.com"`. The SEC blocks requests without one.
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_config(EdgarConfig::new(user_agent))
    }

    /// Creates a client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::ConfigError` if the user agent lacks a name or contact
    /// email, the rate limit is outside `1..=10`, or the HTTP client cannot be built.
    pub fn with_config(config: EdgarConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(config.user_agent.trim())
                .map_err(|e| EdgarError::ConfigError(format!("Invalid user agent: {}", e)))?,
        );

        // gzip/deflate features advertise Accept-Encoding and decode bodies
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| EdgarError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let rate = NonZeroU32::new(config.rate_limit).ok_or_else(|| {
            EdgarError::ConfigError("Rate limit must be greater than zero".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

        let EdgarUrls {
            archives,
            data,
            files,
            sec_api,
        } = config.base_urls;

        Ok(Edgar {
            client,
            rate_limiter,
            edgar_archives_url: archives.trim_end_matches('/').to_string(),
            edgar_data_url: data.trim_end_matches('/').to_string(),
            edgar_files_url: files.trim_end_matches('/').to_string(),
            sec_api_url: sec_api,
            sec_api_key: config.sec_api_key,
            tickers: Arc::new(OnceCell::new()),
        })
    }

    /// Exponential backoff with ±20% jitter: roughly 1s, 2s, 4s, 8s, 16s.
    fn calculate_backoff(retry: u32) -> Duration {
        let backoff_ms = INITIAL_BACKOFF_MS * (2_u64.pow(retry));
        let jitter = (backoff_ms as f64 * 0.2 * (fastrand::f64() - 0.5)) as i64;
        Duration::from_millis((backoff_ms as i64 + jitter) as u64)
    }

    /// A numeric `Retry-After` header wins over our own backoff schedule.
    fn retry_after(headers: &HeaderMap, retry: u32) -> Duration {
        headers
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Self::calculate_backoff(retry))
    }

    /// Sends a request built by `build` until it yields a 2xx response.
    ///
    /// The builder is invoked once per attempt since a sent `RequestBuilder` is consumed.
    async fn send<F>(&self, url: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut retries = 0;

        loop {
            self.rate_limiter.until_ready().await;

            match build().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    match status {
                        reqwest::StatusCode::NOT_FOUND => return Err(EdgarError::NotFound),
                        reqwest::StatusCode::TOO_MANY_REQUESTS => {
                            if retries >= MAX_RETRIES {
                                return Err(EdgarError::RateLimitExceeded);
                            }
                            let wait = Self::retry_after(response.headers(), retries);
                            tracing::warn!(
                                "Rate limit hit (429) for {}. Attempt {}/{}. Waiting for {:?} before retry.",
                                url,
                                retries + 1,
                                MAX_RETRIES + 1,
                                wait
                            );
                            sleep(wait).await;
                            retries += 1;
                        }
                        other => {
                            let body = response
                                .text()
                                .await
                                .unwrap_or_else(|_| "Failed to read error body".to_string());
                            return Err(EdgarError::InvalidResponse(format!(
                                "Unexpected status code: {} for URL: {}. Response preview: {}",
                                other,
                                url,
                                preview(&body)
                            )));
                        }
                    }
                }
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        return Err(EdgarError::RequestError(e));
                    }
                    let wait = Self::calculate_backoff(retries);
                    tracing::warn!(
                        "Request failed for {}: {:?}. Attempt {}/{}. Retrying in {:?}.",
                        url,
                        e,
                        retries + 1,
                        MAX_RETRIES + 1,
                        wait
                    );
                    sleep(wait).await;
                    retries += 1;
                }
            }
        }
    }

    /// Fetches raw bytes, e.g. a filing document written to disk untouched.
    ///
    /// # Errors
    ///
    /// * `EdgarError::NotFound` - HTTP 404
    /// * `EdgarError::RateLimitExceeded` - 429 responses persisted after 5 retries
    /// * `EdgarError::RequestError` - transport failure after 5 retries
    /// * `EdgarError::InvalidResponse` - any other non-success status
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.send(url, || self.client.get(url)).await?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(EdgarError::RequestError)
    }

    /// Fetches a text resource (JSON, HTML or plain text).
    ///
    /// For URLs ending in `.json` a `text/html` answer usually means an SEC error
    /// page. Bodies that still look like JSON are accepted with a warning, since the
    /// SEC sometimes mislabels them; anything else is
    /// `EdgarError::UnexpectedContentType` with a preview of the content.
    pub async fn get(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.send(url, || self.client.get(url)).await?;

        let html_content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .filter(|ct| ct.to_lowercase().contains("text/html"))
            .map(str::to_string);

        let body = response.text().await.map_err(EdgarError::RequestError)?;

        if let (true, Some(ct)) = (url.ends_with(".json"), html_content_type) {
            if looks_like_json(&body) {
                tracing::warn!(
                    "Received text/html content-type for .json URL, but content appears to be JSON: {}",
                    url
                );
            } else {
                return Err(EdgarError::UnexpectedContentType {
                    url: url.to_string(),
                    expected_pattern: "application/json".to_string(),
                    got_content_type: ct,
                    content_preview: preview(&body),
                });
            }
        }

        Ok(body)
    }

    /// POSTs a JSON body and returns the response text.
    pub async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String> {
        tracing::debug!("POST {}", redact_token(url));
        let response = self
            .send(&redact_token(url), || self.client.post(url).json(body))
            .await?;
        response.text().await.map_err(EdgarError::RequestError)
    }

    /// Returns the base URL for EDGAR archives.
    pub fn archives_url(&self) -> &str {
        &self.edgar_archives_url
    }

    /// Returns the base URL for the EDGAR data API.
    pub fn data_url(&self) -> &str {
        &self.edgar_data_url
    }

    /// Returns the base URL for EDGAR files.
    pub fn files_url(&self) -> &str {
        &self.edgar_files_url
    }
}

fn looks_like_json(body: &str) -> bool {
    let start = body.trim_start();
    start.starts_with('{') || start.starts_with('[')
}

fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}

/// Keeps API tokens out of logs and error messages.
fn redact_token(url: &str) -> String {
    match url.split_once("token=") {
        Some((head, tail)) => {
            let rest = tail.find('&').map(|i| &tail[i..]).unwrap_or("");
            format!("{}token=***{}", head, rest)
        }
        None => url.to_string(),
    }
}
