//! Tululu crawler: a resilient book-catalog scraper
//!
//! This crate walks the paginated listing of a tululu.org catalog, extracts
//! per-book metadata, downloads book texts and cover images, and writes a JSON
//! catalog plus a static, paginated HTML gallery.

pub mod config;
pub mod crawler;
pub mod dom;
pub mod output;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum TululuError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid page range: start page {start}, end page {end:?}")]
    InvalidPageRange { start: u32, end: Option<u32> },

    #[error("Could not determine the last catalog page from {url}")]
    PageRangeUnresolved { url: String },

    #[error("Connection lost after {attempts} attempts: {source}")]
    ConnectionLost {
        attempts: u32,
        #[source]
        source: Box<TululuError>,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TululuError {
    /// Returns true if the failure is a connectivity problem worth retrying
    ///
    /// Only connection-level fetch failures are transient. HTTP status errors,
    /// redirect-as-missing responses and parse failures are permanent for the
    /// resource that produced them.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_transient())
    }
}

/// HTTP fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Connection failed for {url}: {source}")]
    Connectivity {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request for {url} could not be made: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected redirect ({status}) from {url} to {location:?}")]
    Redirect {
        url: String,
        status: u16,
        location: Option<String>,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    /// Returns true for connection-level failures (DNS, refused, reset, timeout)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

/// Structural mismatches between a fetched page and the expected layout
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Missing element matching '{selector}'")]
    MissingElement { selector: String },

    #[error("Element <{element}> has no '{attribute}' attribute")]
    MissingAttribute { element: String, attribute: String },

    #[error("Heading '{heading}' is not of the form 'title :: author'")]
    MalformedHeading { heading: String },

    #[error("Pagination label '{text}' is not a page number")]
    InvalidPageNumber { text: String },

    #[error("Cannot resolve '{href}' against the page URL: {source}")]
    InvalidUrl {
        href: String,
        #[source]
        source: ::url::ParseError,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, TululuError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, CrawlParams, Coordinator};
pub use output::{BookRecord, Catalog, CrawlStats};
