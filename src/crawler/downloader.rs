//! Asset downloader for book texts and cover images
//!
//! Files land under a content root (`<root>/books/…`, `<root>/images/…`).
//! Returned paths are relative to that root and use `/` separators, so they
//! can be embedded in the catalog and rendered pages as-is.

use crate::crawler::fetcher::Fetcher;
use crate::Result;
use std::path::PathBuf;
use url::Url;

/// Subdirectory of the content root holding book texts
pub const BOOKS_DIR: &str = "books";

/// Subdirectory of the content root holding cover images
pub const IMAGES_DIR: &str = "images";

/// Characters rejected by at least one common filesystem
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Longest file name most filesystems accept, in bytes
const MAX_FILENAME_BYTES: usize = 255;

/// Downloads assets through a [`Fetcher`] and stores them under a content root
#[derive(Debug, Clone)]
pub struct AssetDownloader {
    fetcher: Fetcher,
    content_root: PathBuf,
}

impl AssetDownloader {
    pub fn new(fetcher: Fetcher, content_root: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            content_root: content_root.into(),
        }
    }

    /// Downloads a book text and stores it as UTF-8
    ///
    /// # Arguments
    ///
    /// * `url` - Text download URL
    /// * `destination_dir` - Directory relative to the content root
    /// * `filename` - Desired file name; sanitized before use
    ///
    /// # Returns
    ///
    /// The stored file's path relative to the content root
    pub async fn store_text(&self, url: &Url, destination_dir: &str, filename: &str) -> Result<String> {
        let text = self.fetcher.fetch_text(url, &[]).await?;
        self.write(destination_dir, filename, text.as_bytes()).await
    }

    /// Downloads an image and stores the bytes untouched
    ///
    /// Same contract as [`AssetDownloader::store_text`].
    pub async fn store_image(
        &self,
        url: &Url,
        destination_dir: &str,
        filename: &str,
    ) -> Result<String> {
        let bytes = self.fetcher.fetch_bytes(url, &[]).await?;
        self.write(destination_dir, filename, &bytes).await
    }

    /// Writes a payload below the content root, replacing any existing file
    async fn write(&self, destination_dir: &str, filename: &str, payload: &[u8]) -> Result<String> {
        let filename = sanitize_filename(filename);
        let dir_path = self.content_root.join(destination_dir);
        tokio::fs::create_dir_all(&dir_path).await?;

        let file_path = dir_path.join(&filename);
        tokio::fs::write(&file_path, payload).await?;
        tracing::debug!("Saved {} ({} bytes)", file_path.display(), payload.len());

        Ok(relative_path(destination_dir, &filename))
    }
}

/// Makes a file name safe to create on common filesystems
///
/// Removes path separators, characters Windows rejects, and control
/// characters; trims surrounding whitespace and trailing dots. Everything else,
/// including non-ASCII text, is kept so titles stay readable. Names that end
/// up empty or reserved become `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !FORBIDDEN_CHARS.contains(c))
        .collect();

    let mut cleaned = cleaned
        .trim()
        .trim_end_matches(['.', ' '])
        .to_string();

    if cleaned.len() > MAX_FILENAME_BYTES {
        let mut cut = MAX_FILENAME_BYTES;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return "_".to_string();
    }

    cleaned
}

/// Percent-decoded last path segment of a URL, used to name cover images
///
/// Falls back to the raw segment when it is not valid UTF-8 once decoded.
pub fn url_basename(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn relative_path(destination_dir: &str, filename: &str) -> String {
    let dir = destination_dir.trim_matches('/');
    if dir.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", dir, filename)
    }
}
