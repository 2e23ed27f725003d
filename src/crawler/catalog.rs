//! Catalog listing page parser
//!
//! A listing page shows one `table.d_book` card per book inside `#content`;
//! the cover image of each card links to the book's detail page. The
//! pagination control is a run of `.npage` links whose last label is the
//! number of the final page.

use crate::dom::Document;
use crate::{ParseError, ParseResult};
use url::Url;

/// Extracts the detail-page URL of every book card, in document order
///
/// # Arguments
///
/// * `html` - The listing page content
/// * `page_url` - URL the page was fetched from, for resolving relative links
///
/// # Returns
///
/// * `Ok(Vec<Url>)` - One absolute URL per book card (possibly empty)
/// * `Err(ParseError)` - `#content` is missing, or a card has no cover link
///
/// # Example
///
/// ```
/// use tululu_crawler::crawler::parse_listing;
/// use url::Url;
///
/// let html = r#"<div id="content">
///     <table class="d_book"><tr><td><div class="bookimage"><a href="/b239/">cover</a></div></td></tr></table>
/// </div>"#;
/// let page_url = Url::parse("https://tululu.org/l55/1").unwrap();
/// let urls = parse_listing(html, &page_url).unwrap();
/// assert_eq!(urls[0].as_str(), "https://tululu.org/b239/");
/// ```
pub fn parse_listing(html: &str, page_url: &Url) -> ParseResult<Vec<Url>> {
    let document = Document::parse(html);
    let content = document.root().require("#content")?;

    content
        .select_all("table.d_book")?
        .into_iter()
        .map(|card| {
            let href = card.require(".bookimage a")?.require_attr("href")?;
            resolve(page_url, href)
        })
        .collect()
}

/// Reads the number of the last catalog page from the pagination control
///
/// # Returns
///
/// * `Ok(u32)` - The label of the last `.npage` element
/// * `Err(ParseError)` - No pagination control, or its last label is not a number
pub fn parse_last_page_number(html: &str) -> ParseResult<u32> {
    let document = Document::parse(html);
    let labels = document.root().select_all(".npage")?;

    let last = labels.last().ok_or_else(|| ParseError::MissingElement {
        selector: ".npage".to_string(),
    })?;

    let text = last.text();
    text.trim()
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidPageNumber { text })
}

/// Resolves a link found on a page to an absolute URL
pub(crate) fn resolve(page_url: &Url, href: &str) -> ParseResult<Url> {
    page_url
        .join(href.trim())
        .map_err(|source| ParseError::InvalidUrl {
            href: href.to_string(),
            source,
        })
}
