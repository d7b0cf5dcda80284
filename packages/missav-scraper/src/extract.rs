//! Field extraction from detail and search pages.
//!
//! Detail pages carry OpenGraph `meta` tags plus a sidebar of labeled rows
//! (`<div class="text-secondary"><span>品番:</span>…</div>`). Labels are
//! matched by exact text in the Japanese locale.

use scraper::{ElementRef, Html, Selector};

use crate::types::RawFields;

const LABEL_IDENTIFIER: &str = "品番:";
const LABEL_PRODUCER: &str = "メーカー:";
const LABEL_SERIES: &str = "シリーズ:";
const LABEL_PERFORMERS: &str = "女優:";
const LABEL_GENRES: &str = "ジャンル:";

/// Site annotations folded out of the on-page identifier, applied in order.
const IDENTIFIER_REPLACEMENTS: [(&str, &str); 4] = [
    ("FC2-PPV-", "FC2-"),
    ("-UNCENSORED-LEAK", ""),
    ("-CHINESE-SUBTITLE", ""),
    ("-ENGLISH-SUBTITLE", ""),
];

const RESULT_CARD: &str = "div[class*='aspect-w-16'][class*='aspect-h-9']";

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse markup. HTML parsing is lenient and never fails.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// `content` of the first `meta[property=…]` tag, or empty.
    fn meta(&self, property: &str) -> String {
        let css = format!("meta[property='{property}']");
        let Ok(selector) = Selector::parse(&css) else {
            return String::new();
        };
        self.html
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .unwrap_or_default()
            .to_string()
    }

    /// Sidebar rows whose label span reads exactly `label`.
    fn labeled_rows(&self, label: &str) -> Vec<ElementRef<'_>> {
        let Ok(selector) = Selector::parse("div.text-secondary") else {
            return Vec::new();
        };
        self.html
            .select(&selector)
            .filter(|div| div.value().attr("class") == Some("text-secondary"))
            .filter(|div| {
                child_elements(*div, "span")
                    .into_iter()
                    .any(|span| normalize_space(&text_of(span)) == label)
            })
            .collect()
    }

    /// Text of the first direct `child` of any row labeled `label`.
    fn row_child_text(&self, label: &str, child: &str, class: Option<&str>) -> String {
        self.labeled_rows(label)
            .into_iter()
            .flat_map(|row| child_elements(row, child))
            .find(|el| class.map_or(true, |c| el.value().attr("class") == Some(c)))
            .map(text_of)
            .unwrap_or_default()
    }

    /// Trimmed direct text nodes of every link inside rows labeled `label`,
    /// one entry per text node. Blank nodes yield empty entries.
    fn row_links(&self, label: &str) -> Vec<String> {
        let Ok(anchor) = Selector::parse("a") else {
            return Vec::new();
        };
        self.labeled_rows(label)
            .into_iter()
            .flat_map(|row| {
                row.select(&anchor)
                    .flat_map(direct_texts)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Raw identifier text from the sidebar, without replacements.
    pub fn raw_identifier(&self) -> String {
        self.row_child_text(LABEL_IDENTIFIER, "span", Some("font-medium"))
            .trim()
            .to_string()
    }

    /// All `attr` values of elements matching `css`, in document order.
    fn attr_values(&self, css: &str, attr: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(css) else {
            return Vec::new();
        };
        self.html
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::to_string)
            .collect()
    }

    /// Every `href` in the page, trimmed, empties dropped.
    pub fn links(&self) -> Vec<String> {
        self.attr_values("a[href]", "href")
            .into_iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }
}

/// Read every known field off a detail page. Absent fields come back empty.
pub fn extract(doc: &Document) -> RawFields {
    RawFields {
        identifier: clean_identifier(&doc.raw_identifier()),
        canonical_url: doc.meta("og:url"),
        title: strip_title_tag(&doc.meta("og:title")),
        synopsis: doc.meta("og:description"),
        cover_url: doc.meta("og:image"),
        director: doc.meta("og:video:director"),
        release_date: doc.meta("og:video:release_date"),
        duration_minutes: parse_duration_minutes(&doc.meta("og:video:duration")),
        performers: doc.row_links(LABEL_PERFORMERS),
        genres: doc.row_links(LABEL_GENRES),
        producer_candidate: doc.row_child_text(LABEL_PRODUCER, "a", None).trim().to_string(),
        serial_candidate: doc.row_child_text(LABEL_SERIES, "a", None).trim().to_string(),
    }
}

/// Apply the site's identifier replacements.
pub fn clean_identifier(raw: &str) -> String {
    IDENTIFIER_REPLACEMENTS
        .iter()
        .fold(raw.to_string(), |id, (from, to)| id.replace(from, to))
}

/// Titles are prefixed with a one-word tag followed by a space.
fn strip_title_tag(raw: &str) -> String {
    match raw.split_once(' ') {
        Some((_, rest)) => rest.to_string(),
        None => raw.to_string(),
    }
}

/// Seconds to whole minutes (floor), `None` when not an integer.
fn parse_duration_minutes(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .map(|secs| secs.div_euclid(60))
}

/// Result identifiers and detail links from a search page.
///
/// The two lists are positionally aligned: both come from the same result
/// cards, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub ids: Vec<String>,
    pub urls: Vec<String>,
}

impl SearchResults {
    pub fn parse(doc: &Document) -> Self {
        Self {
            ids: doc.attr_values(&format!("{RESULT_CARD} img[alt]"), "alt"),
            urls: doc.attr_values(&format!("{RESULT_CARD} a[href]"), "href"),
        }
    }

    /// Link of the first result whose identifier equals `key`, ignoring case.
    pub fn find(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        let idx = self
            .ids
            .iter()
            .position(|id| id.trim().to_lowercase() == key)?;
        self.urls.get(idx).map(String::as_str)
    }
}

fn child_elements<'a>(parent: ElementRef<'a>, name: &str) -> Vec<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == name)
        .collect()
}

fn direct_texts(el: ElementRef<'_>) -> Vec<String> {
    el.children()
        .filter_map(|node| node.value().as_text().map(|t| t.trim().to_string()))
        .collect()
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
