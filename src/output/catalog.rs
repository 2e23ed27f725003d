//! Book records and the JSON catalog file

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name used when the catalog location is given as a directory
pub const CATALOG_FILE_NAME: &str = "books.json";

/// One successfully crawled book
///
/// Field order is the key order of the catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Stored text path relative to the content root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_path: Option<String>,

    /// Stored cover path relative to the content root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,

    pub title: String,
    pub author: String,

    #[serde(default)]
    pub comments: Vec<String>,

    #[serde(default)]
    pub genres: Vec<String>,

    /// Detail page the record was built from; not part of the catalog file
    #[serde(skip)]
    pub source_url: String,
}

/// Ordered list of books collected by a run
pub type Catalog = Vec<BookRecord>;

/// Resolves a catalog location to a file path
///
/// An existing directory, or a path without a file extension, receives
/// `books.json`; anything else is used as the file path itself.
pub fn catalog_file_path(location: &Path) -> PathBuf {
    if location.is_dir() || location.extension().is_none() {
        location.join(CATALOG_FILE_NAME)
    } else {
        location.to_path_buf()
    }
}

/// Serializes a catalog: 2-space indent, non-ASCII kept literal
pub fn catalog_to_string(catalog: &[BookRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(catalog)?)
}

/// Writes the catalog file, creating parent directories as needed
pub fn write_catalog(path: &Path, catalog: &[BookRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, catalog_to_string(catalog)?)?;
    tracing::info!("Catalog with {} books written to {}", catalog.len(), path.display());

    Ok(())
}

/// Loads a catalog file written by [`write_catalog`]
pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
