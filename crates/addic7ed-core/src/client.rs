//! HTTP transport session for Addic7ed
//!
//! Provides a throttled HTTP session that presents itself as a desktop
//! browser and returns whole response bodies as owned buffers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error};

use crate::error::{Addic7edError, Result};
use crate::url::{BASE_URL, normalize_base_url};

/// User-Agent of a current desktop Firefox
pub const FIREFOX_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Browser whose request headers the session imitates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Impersonate {
    /// Send the header set of desktop Firefox
    #[default]
    Firefox,
    /// Send only User-Agent and Referer
    None,
}

impl Impersonate {
    /// Headers sent with every request, besides User-Agent and Referer
    fn headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Impersonate::Firefox => &[
                (
                    "accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
                ),
                ("accept-language", "en-US,en;q=0.5"),
                ("upgrade-insecure-requests", "1"),
                ("sec-fetch-dest", "document"),
                ("sec-fetch-mode", "navigate"),
                ("sec-fetch-site", "same-origin"),
                ("sec-fetch-user", "?1"),
            ],
            Impersonate::None => &[],
        }
    }
}

/// Configuration for the HTTP session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site root (default: "https://www.addic7ed.com/")
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Minimum spacing between two requests (default: 5s)
    pub min_request_interval: Duration,
    /// User-Agent header (default: desktop Firefox)
    pub user_agent: String,
    /// Cookie string sent as is on every request, e.g. "PHPSESSID=abc; wikisubtitlesuser=1"
    pub cookie: Option<String>,
    /// Header set to imitate (default: Firefox)
    pub impersonate: Impersonate,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout_secs: 30,
            min_request_interval: Duration::from_secs(5),
            user_agent: FIREFOX_USER_AGENT.to_string(),
            cookie: None,
            impersonate: Impersonate::Firefox,
        }
    }
}

/// Rate limiter to control request frequency
///
/// Ensures requests are spaced at least `min_interval` apart.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given minimum spacing
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Acquire permission to make a request
    ///
    /// If called before the minimum interval has passed since the last request,
    /// this method will sleep until the interval has elapsed.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// One fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL after redirects
    pub url: String,
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Body bytes, decompressed
    pub content: Vec<u8>,
}

impl Response {
    /// Value of the Content-Type header, empty if absent or not text
    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Whether the body is empty (e.g., a 304 Not Modified)
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// HTTP session owned by one provider
///
/// Handles all HTTP communication with Addic7ed, including:
/// - Throttling to one request per `min_request_interval`
/// - Browser-like headers, Referer and session cookies
/// - Mapping timeouts and error statuses to [`Addic7edError`]
pub struct Session {
    client: reqwest::Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl Session {
    /// Create a new session with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a new session with custom configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url);
        Url::parse(&base_url)
            .map_err(|e| Addic7edError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, header_value(&base_url)?);
        // fixed header, no cookie store: order is kept and Set-Cookie is ignored
        if let Some(cookie) = config.cookie.as_deref().map(normalize_cookie)
            && !cookie.is_empty()
        {
            headers.insert(header::COOKIE, header_value(&cookie)?);
        }
        for (name, value) in config.impersonate.headers() {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(header_value(&config.user_agent)?)
            .redirect(reqwest::redirect::Policy::limited(10))
            .tcp_keepalive(Duration::from_secs(60))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .default_headers(headers)
            .build()
            .map_err(Addic7edError::Transport)?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.min_request_interval),
            base_url,
        })
    }

    /// Site root, always ending with `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one GET request and buffer the whole response
    ///
    /// Waits on the throttle first.
    ///
    /// # Errors
    /// - `Timeout` - Request exceeded the configured timeout
    /// - `Transport` - Connection, TLS or body errors
    /// - `HttpStatus` - Server answered with 4xx or 5xx
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.rate_limiter.acquire().await;
        debug!("GET {}", url);

        let result = self.do_get(url).await;
        if let Err(e) = &result
            && matches!(e, Addic7edError::Timeout(_) | Addic7edError::Transport(_))
        {
            error!("Failed to get '{}': {}", url, e);
        }
        result
    }

    async fn do_get(&self, url: &str) -> Result<Response> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let content = response.bytes().await?.to_vec();

        check_status(status, url)?;

        Ok(Response {
            url: final_url,
            status,
            headers,
            content,
        })
    }

    /// Get a reference to the rate limiter (for testing)
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

/// Map 4xx and 5xx statuses to `HttpStatus`
fn check_status(status: StatusCode, url: &str) -> Result<()> {
    let kind = if status.is_client_error() {
        "Client Error"
    } else if status.is_server_error() {
        "Server Error"
    } else {
        return Ok(());
    };

    let reason = status.canonical_reason().unwrap_or("<unknown>");
    Err(Addic7edError::HttpStatus {
        status: status.as_u16(),
        message: format!("{} {}: {} for url: {}", status.as_u16(), kind, reason, url),
    })
}

/// Split "a=1; b=2;" into ["a=1", "b=2"]
fn split_cookie_string(cookie: &str) -> impl Iterator<Item = &str> {
    cookie.split(';').map(str::trim).filter(|pair| !pair.is_empty())
}

/// Cookie header value with empty pairs and the trailing `; ` removed
fn normalize_cookie(cookie: &str) -> String {
    split_cookie_string(cookie).collect::<Vec<_>>().join("; ")
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Addic7edError::InvalidConfig(format!("{:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        assert_eq!(limiter.min_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://www.addic7ed.com/");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.min_request_interval, Duration::from_secs(5));
        assert_eq!(config.impersonate, Impersonate::Firefox);
        assert!(config.cookie.is_none());
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert!(session.is_ok());
        assert_eq!(session.unwrap().base_url(), "https://www.addic7ed.com/");
    }

    #[test]
    fn test_session_with_cookie_and_plain_headers() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9999".to_string(),
            cookie: Some("PHPSESSID=abc; wikisubtitlesuser=42; ".to_string()),
            impersonate: Impersonate::None,
            ..Default::default()
        };
        let session = Session::with_config(&config).unwrap();
        assert_eq!(session.base_url(), "http://127.0.0.1:9999/");
    }

    #[test]
    fn test_session_rejects_bad_base_url() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Session::with_config(&config),
            Err(Addic7edError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_session_rejects_bad_user_agent() {
        let config = ClientConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Session::with_config(&config),
            Err(Addic7edError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_split_cookie_string() {
        let pairs: Vec<&str> = split_cookie_string("wikisubtitlesuser=1; wikisubtitlespass=x; PHPSESSID=y; ").collect();
        assert_eq!(pairs, vec!["wikisubtitlesuser=1", "wikisubtitlespass=x", "PHPSESSID=y"]);
    }

    #[test]
    fn test_normalize_cookie_keeps_order() {
        assert_eq!(
            normalize_cookie("wikisubtitlesuser=1; wikisubtitlespass=x; PHPSESSID=y; "),
            "wikisubtitlesuser=1; wikisubtitlespass=x; PHPSESSID=y"
        );
        assert_eq!(normalize_cookie(" ; "), "");
    }

    #[test]
    fn test_session_rejects_bad_cookie() {
        let config = ClientConfig {
            cookie: Some("PHPSESSID=a\nb".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Session::with_config(&config),
            Err(Addic7edError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK, "u").is_ok());
        assert!(check_status(StatusCode::NOT_MODIFIED, "u").is_ok());

        match check_status(StatusCode::NOT_FOUND, "https://x/y") {
            Err(Addic7edError::HttpStatus { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "404 Client Error: Not Found for url: https://x/y");
            }
            other => panic!("Expected HttpStatus, got {:?}", other),
        }

        match check_status(StatusCode::SERVICE_UNAVAILABLE, "https://x/y") {
            Err(Addic7edError::HttpStatus { status, message }) => {
                assert_eq!(status, 503);
                assert!(message.starts_with("503 Server Error: Service Unavailable"));
            }
            other => panic!("Expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limiter_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        // Second acquire should wait at least 100ms
        assert!(elapsed >= Duration::from_millis(90)); // Allow small tolerance
    }
}
