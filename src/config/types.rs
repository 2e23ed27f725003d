use serde::Deserialize;

/// Main configuration structure for the crawler
///
/// Every section and key has a default, so an empty file (or no file at all)
/// yields a configuration that crawls the tululu.org science-fiction catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Origin site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Listing root; page `n` lives at `<catalog-url><n>`
    #[serde(rename = "catalog-url", default = "default_catalog_url")]
    pub catalog_url: String,
}

/// Crawler pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Pause between consecutive page/book operations (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Pause before retrying after a connectivity failure (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Consecutive connectivity failures tolerated before the run is halted
    #[serde(
        rename = "max-connection-retries",
        default = "default_max_connection_retries"
    )]
    pub max_connection_retries: u32,

    /// Whole-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// TCP connect timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Content root holding `books/` and `images/`
    #[serde(rename = "dest-folder", default = "default_dest_folder")]
    pub dest_folder: String,

    /// Path of the JSON catalog file
    #[serde(rename = "json-path", default = "default_json_path")]
    pub json_path: String,

    /// Directory the HTML gallery is rendered into
    #[serde(rename = "pages-dir", default = "default_pages_dir")]
    pub pages_dir: String,

    /// The content root as referenced from inside `pages-dir`
    #[serde(rename = "media-url", default = "default_media_url")]
    pub media_url: String,

    #[serde(rename = "books-per-page", default = "default_books_per_page")]
    pub books_per_page: usize,

    #[serde(rename = "books-per-row", default = "default_books_per_row")]
    pub books_per_row: usize,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_connection_retries: default_max_connection_retries(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dest_folder: default_dest_folder(),
            json_path: default_json_path(),
            pages_dir: default_pages_dir(),
            media_url: default_media_url(),
            books_per_page: default_books_per_page(),
            books_per_row: default_books_per_row(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://tululu.org/l55/".to_string()
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_retry_backoff_ms() -> u64 {
    5000
}

fn default_max_connection_retries() -> u32 {
    10
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_crawler_name() -> String {
    "tululu-crawler".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_dest_folder() -> String {
    "media".to_string()
}

fn default_json_path() -> String {
    "media/books.json".to_string()
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

fn default_media_url() -> String {
    "../media".to_string()
}

fn default_books_per_page() -> usize {
    10
}

fn default_books_per_row() -> usize {
    2
}
