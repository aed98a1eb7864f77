//! DOM query capability shared by both acquisition strategies.
//!
//! Either strategy hands back a [`DomSnapshot`]: the serialized document
//! plus the URL it came from. The snapshot is `Send` and cheap to move
//! across tasks; [`DomSnapshot::parse`] turns it into an [`HtmlDocument`]
//! that the extraction engine walks through the [`DomQuery`] trait.

use scraper::{ElementRef, Html, Node, Selector};

/// Serialized page DOM produced by a renderer or fetcher.
#[derive(Debug, Clone)]
pub struct DomSnapshot {
    /// URL the document was loaded from, after redirects.
    pub url: String,
    pub html: String,
}

impl DomSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn parse(&self) -> HtmlDocument {
        HtmlDocument::parse(&self.html)
    }
}

/// Read-only selector queries over a document.
///
/// Every lookup is tolerant: a selector that matches nothing, or that
/// fails to parse, yields `None` or an empty list.
pub trait DomQuery {
    type Element<'a>: Copy
    where
        Self: 'a;

    /// Text of the `<title>` element, if non-empty.
    fn title(&self) -> Option<String>;

    fn select_first(&self, selector: &str) -> Option<Self::Element<'_>>;

    /// All matches in document order, at most `limit` when given.
    fn select_all(&self, selector: &str, limit: Option<usize>) -> Vec<Self::Element<'_>>;

    /// Matches among the descendants of `scope`.
    fn select_within<'a>(
        &'a self,
        scope: Self::Element<'a>,
        selector: &str,
        limit: Option<usize>,
    ) -> Vec<Self::Element<'a>>;

    /// Trimmed inner text.
    fn text(&self, element: Self::Element<'_>) -> String;

    fn attr(&self, element: Self::Element<'_>, name: &str) -> Option<String>;
}

/// A parsed HTML document backed by `scraper`.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::debug!("invalid selector {selector:?}: {e:?}");
            None
        }
    }
}

/// Elements whose boundaries start a new line in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "caption", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table",
    "tbody", "tfoot", "thead", "tr", "ul",
];

/// Accumulates rendered text: whitespace runs collapse to one space and
/// no line starts or ends with a space.
#[derive(Default)]
struct TextBuilder {
    out: String,
    pending_space: bool,
}

impl TextBuilder {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            if self.pending_space && !self.out.is_empty() && !self.out.ends_with('\n') {
                self.out.push(' ');
            }
            self.pending_space = false;
            self.out.push(c);
        }
    }

    fn line_break(&mut self) {
        self.out.push('\n');
        self.pending_space = false;
    }

    fn block_boundary(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.line_break();
        }
    }

    fn walk_element(&mut self, element: ElementRef<'_>) {
        match element.value().name() {
            "script" | "style" | "noscript" | "template" => {}
            "br" => self.line_break(),
            "td" | "th" => {
                self.pending_space = true;
                self.walk_children(element);
                self.pending_space = true;
            }
            name if BLOCK_ELEMENTS.contains(&name) => {
                self.block_boundary();
                self.walk_children(element);
                self.block_boundary();
            }
            _ => self.walk_children(element),
        }
    }

    fn walk_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.walk_element(child);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Approximates `innerText`: source whitespace collapses, `<br>` and
/// block-level boundaries are line breaks, script or style bodies are
/// skipped.
fn inner_text(element: ElementRef<'_>) -> String {
    let mut builder = TextBuilder::default();
    builder.walk_children(element);
    builder.out.trim().to_string()
}

impl DomQuery for HtmlDocument {
    type Element<'a> = ElementRef<'a>;

    fn title(&self) -> Option<String> {
        self.select_first("title")
            .map(inner_text)
            .filter(|t| !t.is_empty())
    }

    fn select_first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let sel = parse_selector(selector)?;
        self.html.select(&sel).next()
    }

    fn select_all(&self, selector: &str, limit: Option<usize>) -> Vec<ElementRef<'_>> {
        let Some(sel) = parse_selector(selector) else {
            return Vec::new();
        };
        self.html
            .select(&sel)
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    fn select_within<'a>(
        &'a self,
        scope: ElementRef<'a>,
        selector: &str,
        limit: Option<usize>,
    ) -> Vec<ElementRef<'a>> {
        let Some(sel) = parse_selector(selector) else {
            return Vec::new();
        };
        scope
            .select(&sel)
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    fn text(&self, element: ElementRef<'_>) -> String {
        inner_text(element)
    }

    fn attr(&self, element: ElementRef<'_>, name: &str) -> Option<String> {
        element.value().attr(name).map(str::to_string)
    }
}
