//! Minimal DOM query layer over `scraper`
//!
//! Page parsers only need four capabilities: select the first element
//! matching a CSS selector, select all of them, read an attribute, and read
//! the text content. [`Document`] and [`Node`] expose exactly that, and turn
//! missing structure into [`ParseError`] values instead of panics.
//!
//! `scraper::Html` is not `Send`, so documents are parsed and dropped inside
//! synchronous functions and never held across an `.await`.

use crate::{ParseError, ParseResult};
use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document
pub struct Document {
    html: Html,
}

/// A single element inside a [`Document`]
#[derive(Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl Document {
    /// Parses a full HTML document; malformed markup is recovered, never rejected
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// The `<html>` element, the entry point for all queries
    pub fn root(&self) -> Node<'_> {
        Node {
            element: self.html.root_element(),
        }
    }
}

impl<'a> Node<'a> {
    /// Returns the first descendant matching `selector`, if any
    pub fn select_first(&self, selector: &str) -> ParseResult<Option<Node<'a>>> {
        let selector = compile(selector)?;
        Ok(self.element.select(&selector).next().map(Node::from))
    }

    /// Returns all descendants matching `selector` in document order
    pub fn select_all(&self, selector: &str) -> ParseResult<Vec<Node<'a>>> {
        let selector = compile(selector)?;
        Ok(self.element.select(&selector).map(Node::from).collect())
    }

    /// Like [`Node::select_first`], but a missing match is a [`ParseError`]
    pub fn require(&self, selector: &str) -> ParseResult<Node<'a>> {
        self.select_first(selector)?
            .ok_or_else(|| ParseError::MissingElement {
                selector: selector.to_string(),
            })
    }

    /// Reads an attribute value
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Reads an attribute value, failing if it is absent
    pub fn require_attr(&self, name: &str) -> ParseResult<&'a str> {
        self.attr(name).ok_or_else(|| ParseError::MissingAttribute {
            element: self.tag_name().to_string(),
            attribute: name.to_string(),
        })
    }

    /// Concatenated text of this element and all its descendants, untrimmed
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// The element's tag name
    pub fn tag_name(&self) -> &'a str {
        self.element.value().name()
    }
}

impl<'a> From<ElementRef<'a>> for Node<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

fn compile(selector: &str) -> ParseResult<Selector> {
    Selector::parse(selector).map_err(|_| ParseError::InvalidSelector(selector.to_string()))
}
