//! Static HTML gallery generation
//!
//! This module renders the catalog into paginated HTML pages
//! (`index1.html`, `index2.html`, …), a grid of book cards with covers,
//! genres and links to the downloaded texts.

use crate::config::OutputConfig;
use crate::output::catalog::BookRecord;
use crate::Result;
use std::path::{Path, PathBuf};

/// Layout and location of the rendered gallery
#[derive(Debug, Clone)]
pub struct GalleryOptions {
    /// Directory the pages are written to
    pub pages_dir: PathBuf,

    /// Prefix prepended to stored asset paths, as seen from `pages_dir`
    pub media_url: String,

    pub books_per_page: usize,
    pub books_per_row: usize,
}

impl GalleryOptions {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            pages_dir: PathBuf::from(&config.pages_dir),
            media_url: config.media_url.clone(),
            books_per_page: config.books_per_page,
            books_per_row: config.books_per_row,
        }
    }
}

/// Renders the catalog into `index<n>.html` files
///
/// An empty catalog still produces a single (empty) first page.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - The written pages, in page order
/// * `Err(TululuError)` - Failed to create the directory or write a page
pub fn render_gallery(catalog: &[BookRecord], options: &GalleryOptions) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&options.pages_dir)?;

    let per_page = options.books_per_page.max(1);
    let mut chunks: Vec<&[BookRecord]> = catalog.chunks(per_page).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }

    let page_count = chunks.len();
    let mut written = Vec::with_capacity(page_count);

    for (index, books) in chunks.into_iter().enumerate() {
        let page_number = index + 1;
        let html = format_page(books, page_number, page_count, options);
        let path = options.pages_dir.join(page_file_name(page_number));
        std::fs::write(&path, html)?;
        written.push(path);
    }

    tracing::info!(
        "Rendered {} gallery pages into {}",
        written.len(),
        options.pages_dir.display()
    );

    Ok(written)
}

/// File name of a gallery page
pub fn page_file_name(page_number: usize) -> String {
    format!("index{}.html", page_number)
}

/// Formats one gallery page
pub fn format_page(
    books: &[BookRecord],
    page_number: usize,
    page_count: usize,
    options: &GalleryOptions,
) -> String {
    let mut html = String::new();

    html.push_str("<!doctype html>\n<html lang=\"ru\">\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "  <title>Библиотека: страница {} из {}</title>\n",
        page_number, page_count
    ));
    html.push_str("</head>\n<body>\n");

    html.push_str(&format_pagination(page_number, page_count));

    let per_row = options.books_per_row.max(1);
    for row in books.chunks(per_row) {
        html.push_str("  <div class=\"row\">\n");
        for book in row {
            html.push_str(&format_card(book, &options.media_url));
        }
        html.push_str("  </div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn format_card(book: &BookRecord, media_url: &str) -> String {
    let mut card = String::new();
    card.push_str("    <div class=\"book\">\n");

    if let Some(img_src) = &book.img_src {
        card.push_str(&format!(
            "      <img src=\"{}\" alt=\"{}\">\n",
            escape_html(&media_link(media_url, img_src)),
            escape_html(&book.title)
        ));
    }

    card.push_str(&format!("      <h3>{}</h3>\n", escape_html(&book.title)));
    card.push_str(&format!("      <p>{}</p>\n", escape_html(&book.author)));

    if !book.genres.is_empty() {
        card.push_str("      <p>");
        let genres: Vec<String> = book
            .genres
            .iter()
            .map(|genre| format!("<span class=\"genre\">{}</span>", escape_html(genre)))
            .collect();
        card.push_str(&genres.join(" "));
        card.push_str("</p>\n");
    }

    if let Some(book_path) = &book.book_path {
        card.push_str(&format!(
            "      <a href=\"{}\" target=\"_blank\">Читать</a>\n",
            escape_html(&media_link(media_url, book_path))
        ));
    }

    card.push_str("    </div>\n");
    card
}

fn format_pagination(page_number: usize, page_count: usize) -> String {
    let mut nav = String::from("  <nav class=\"pagination\">\n");

    if page_number > 1 {
        nav.push_str(&format!(
            "    <a href=\"{}\">&laquo;</a>\n",
            page_file_name(page_number - 1)
        ));
    }

    for number in 1..=page_count {
        if number == page_number {
            nav.push_str(&format!("    <span class=\"current\">{}</span>\n", number));
        } else {
            nav.push_str(&format!(
                "    <a href=\"{}\">{}</a>\n",
                page_file_name(number),
                number
            ));
        }
    }

    if page_number < page_count {
        nav.push_str(&format!(
            "    <a href=\"{}\">&raquo;</a>\n",
            page_file_name(page_number + 1)
        ));
    }

    nav.push_str("  </nav>\n");
    nav
}

/// Joins the media prefix and a stored relative path with a single `/`
///
/// Each segment of the stored path is percent-encoded; titles may contain
/// `#`, `%`, `?` or spaces. The prefix is used as configured.
fn media_link(media_url: &str, stored: &str) -> String {
    let encoded: Vec<String> = stored
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    let path = encoded.join("/");

    let prefix = media_url.trim_end_matches('/');
    if prefix.is_empty() {
        path
    } else {
        format!("{}/{}", prefix, path)
    }
}

/// Escapes text for use in HTML content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Convenience wrapper: read the catalog file and render it
pub fn render_catalog_file(catalog_path: &Path, options: &GalleryOptions) -> Result<Vec<PathBuf>> {
    let catalog = crate::output::catalog::read_catalog(catalog_path)?;
    render_gallery(&catalog, options)
}
