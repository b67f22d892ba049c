//! HTTP fetcher backed by reqwest.
//!
//! ### Status handling
//! - Any response the server sends is returned, 4xx/5xx included; the
//!   engine decides what to cache.
//! - Only transport problems are errors: timeouts map to
//!   `Error::Timeout`, everything else to `Error::Transport`.
//! - Bodies larger than `max_bytes`, by `Content-Length` or by bytes
//!   actually read, are transport failures.
//!
//! ### Cache directives
//! - `CacheMode::Reload` sends `Cache-Control: no-cache` and `Pragma: no-cache`
//!   so intermediaries revalidate.
//! - `CacheMode::NoStore` sends `Cache-Control: no-store`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use harbor_core::{AppConfig, CacheMode, Error, Fetcher, Request, Response};
use reqwest::Client;

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "harbor/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Outer bound on any single request (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "harbor/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), ..Default::default() }
    }
}

/// Network fetcher used by the proxy in production.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Unsupported(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (name, value) in cache_headers(request.cache) {
            builder = builder.header(*name, *value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        if let Some(len) = response.content_length() {
            check_size(len as usize, self.config.max_bytes)?;
        }

        let body = response.bytes().await.map_err(transport_error)?;
        check_size(body.len(), self.config.max_bytes)?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

/// Extra request headers implementing a cache directive.
fn cache_headers(mode: CacheMode) -> &'static [(&'static str, &'static str)] {
    const RELOAD: &[(&str, &str)] = &[("cache-control", "no-cache"), ("pragma", "no-cache")];
    const NO_STORE: &[(&str, &str)] = &[("cache-control", "no-store")];

    match mode {
        CacheMode::Default => &[],
        CacheMode::Reload => RELOAD,
        CacheMode::NoStore => NO_STORE,
    }
}

fn check_size(len: usize, max_bytes: usize) -> Result<(), Error> {
    if len > max_bytes {
        return Err(Error::Transport(format!("response body of {len} bytes exceeds {max_bytes}")));
    }
    Ok(())
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() { Error::Timeout(err.to_string()) } else { Error::Transport(err.to_string()) }
}
