//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Treating server redirects as "resource not found"
//! - Error classification (connectivity vs. permanent HTTP failures)

use crate::config::Config;
use crate::FetchError;
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// Automatic redirect following is disabled: the origin answers requests for
/// missing books and texts with a redirect to its front page, so any 3xx is
/// surfaced to [`Fetcher`] as a [`FetchError::Redirect`].
///
/// # Example
///
/// ```no_run
/// use tululu_crawler::config::Config;
/// use tululu_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_millis(config.crawler.request_timeout_ms))
        .connect_timeout(Duration::from_millis(config.crawler.connect_timeout_ms))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues GET requests and maps every failure onto [`FetchError`]
///
/// # Error classification
///
/// | Condition | Error |
/// |-----------|-------|
/// | DNS failure, refused, reset, timeout, body read failure | `Connectivity` (retryable) |
/// | unsupported URL scheme, unbuildable request, undecodable body | `Request` (permanent) |
/// | 3xx response | `Redirect` (permanent) |
/// | any other non-2xx response | `HttpStatus` (permanent) |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with a client built from the configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends a GET request and checks the response status
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to fetch
    /// * `query` - Extra query parameters appended to the URL's own query string
    pub async fn fetch(&self, url: &Url, query: &[(&str, &str)]) -> Result<Response, FetchError> {
        tracing::trace!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|source| classify(url, source))?;

        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            return Err(FetchError::Redirect {
                url: url.to_string(),
                status: status.as_u16(),
                location,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// Fetches a resource and decodes it as text
    pub async fn fetch_text(&self, url: &Url, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let response = self.fetch(url, query).await?;
        response
            .text()
            .await
            .map_err(|source| classify(url, source))
    }

    /// Fetches a resource as raw bytes
    pub async fn fetch_bytes(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<u8>, FetchError> {
        let response = self.fetch(url, query).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| classify(url, source))
    }
}

/// Sorts a client error into retryable and permanent failures
///
/// Only failures on the wire count as connectivity problems. A request the
/// client refuses to build (such as a `data:` or `javascript:` URL) fails the
/// same way on every attempt.
fn classify(url: &Url, source: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if source.is_connect() || source.is_timeout() || source.is_request() || source.is_body() {
        FetchError::Connectivity { url, source }
    } else {
        FetchError::Request { url, source }
    }
}
