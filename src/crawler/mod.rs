//! Crawler module for catalog traversal and book downloads
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect-as-missing detection
//! - Bounded retry for connectivity failures, and request pacing
//! - Listing and book page parsing
//! - Book text and cover image downloads
//! - Overall crawl coordination

mod book;
mod catalog;
mod coordinator;
mod downloader;
mod fetcher;
mod pacer;
mod retry;

pub use book::{parse_book, split_heading, BookFields, HEADING_DELIMITER, TEXT_DOWNLOAD_LABEL};
pub use catalog::{parse_last_page_number, parse_listing};
pub use coordinator::{run_crawl, Coordinator, CrawlParams, CrawlReport};
pub use downloader::{sanitize_filename, url_basename, AssetDownloader, BOOKS_DIR, IMAGES_DIR};
pub use fetcher::{build_http_client, Fetcher};
pub use pacer::Pacer;
pub use retry::{Outcome, RetryGovernor};
