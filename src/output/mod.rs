//! Output module for crawl results
//!
//! This module handles:
//! - The book record model and the JSON catalog file
//! - Rendering the catalog as a paginated static HTML gallery
//! - Recording and printing run statistics

mod catalog;
mod gallery;
pub mod stats;

pub use catalog::{
    catalog_file_path, catalog_to_string, read_catalog, write_catalog, BookRecord, Catalog,
    CATALOG_FILE_NAME,
};
pub use gallery::{
    escape_html, format_page, page_file_name, render_catalog_file, render_gallery, GalleryOptions,
};
pub use stats::{print_statistics, CrawlStats};
