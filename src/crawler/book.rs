//! Book detail page parser

use crate::crawler::catalog::resolve;
use crate::dom::{Document, Node};
use crate::{ParseError, ParseResult};
use url::Url;

/// Label of the plain-text download link on a book page
pub const TEXT_DOWNLOAD_LABEL: &str = "скачать txt";

/// Separator between title and author in the page heading
pub const HEADING_DELIMITER: &str = "::";

/// Metadata extracted from one book page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,

    /// Absolute URL of the cover image
    pub image_url: Url,

    /// Absolute URL of the plain-text download, when the site offers one
    pub download_url: Option<Url>,

    /// Reader comments in page order
    pub comments: Vec<String>,

    /// Genre labels in page order, without repeats
    pub genres: Vec<String>,
}

/// Parses a book detail page
///
/// Pure transformation: no network or filesystem access.
///
/// # Arguments
///
/// * `html` - The book page content
/// * `page_url` - URL the page was fetched from, for resolving relative links
///
/// # Returns
///
/// * `Ok(BookFields)` - Extracted metadata
/// * `Err(ParseError)` - The page does not have the expected layout, or its
///   heading does not contain exactly one `::`
pub fn parse_book(html: &str, page_url: &Url) -> ParseResult<BookFields> {
    let document = Document::parse(html);
    let content = document.root().require("#content")?;

    let (title, author) = split_heading(&content.require("h1")?.text())?;

    let image_src = content.require(".bookimage img")?.require_attr("src")?;
    let image_url = resolve(page_url, image_src)?;

    let download_url = find_download_link(&content)?
        .map(|href| resolve(page_url, href))
        .transpose()?;

    let comments = content
        .select_all(".texts")?
        .into_iter()
        .map(|comment| -> ParseResult<String> { Ok(comment.require(".black")?.text()) })
        .collect::<ParseResult<Vec<_>>>()?;

    let mut genres: Vec<String> = Vec::new();
    for genre in content.select_all("span.d_book a")? {
        let genre = genre.text();
        if !genres.contains(&genre) {
            genres.push(genre);
        }
    }

    Ok(BookFields {
        title,
        author,
        image_url,
        download_url,
        comments,
        genres,
    })
}

/// Splits `"Title :: Author"` into its trimmed halves
///
/// Anything other than exactly one delimiter is rejected rather than guessed.
pub fn split_heading(heading: &str) -> ParseResult<(String, String)> {
    let mut parts = heading.split(HEADING_DELIMITER);

    match (parts.next(), parts.next(), parts.next()) {
        (Some(title), Some(author), None) => {
            Ok((title.trim().to_string(), author.trim().to_string()))
        }
        _ => Err(ParseError::MalformedHeading {
            heading: heading.trim().to_string(),
        }),
    }
}

/// Finds the href of the first link whose text is the text-download label
fn find_download_link<'a>(content: &Node<'a>) -> ParseResult<Option<&'a str>> {
    let link = content
        .select_all("a[href]")?
        .into_iter()
        .find(|link| link.text().trim() == TEXT_DOWNLOAD_LABEL);

    Ok(link.and_then(|link| link.attr("href")))
}
