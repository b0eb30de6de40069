//! HTML parser for extracting links and page fields
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from `<a href>` tags), resolved to absolute URLs
//! - Scraped fields merged into pipeline records (title, meta, headings, text)
//! - Visible text, used by the render heuristic
//!
//! html5ever never rejects input, so malformed markup degrades to whatever
//! the tree builder recovers, usually an empty link set.

use crate::url::{normalize_parsed, LinkPolicy};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// All links found on the page (absolute, normalized URLs)
    pub links: Vec<Url>,
}

/// Fields scraped from a page, merged into records under `scraped`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapedFields {
    pub title: Option<String>,
    /// `<meta name|property=... content=...>` pairs
    pub meta: BTreeMap<String, String>,
    /// Text of h1, h2 and h3 headings in document order
    pub headings: Vec<String>,
    /// Visible body text with whitespace collapsed
    pub text: String,
}

/// Parses HTML content and extracts links and the title
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anywhere in the document, resolved against
/// `base_url`.
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to an `http`/`https` URL with a host
///
/// # Example
///
/// ```
/// use ripple_pipeline::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_anchor_links(&document, base_url),
    }
}

/// Extracts the links of a page that `policy` allows the crawler to follow
///
/// Duplicate links on one page are reported once, in first-seen order.
pub fn extract_links(html: &str, base_url: &Url, policy: &LinkPolicy) -> Vec<Url> {
    let mut links: Vec<Url> = Vec::new();
    for link in parse_html(html, base_url).links {
        if policy.allows(base_url, &link) && !links.contains(&link) {
            links.push(link);
        }
    }
    links
}

/// Scrapes the title, meta tags, headings and visible text of a page
pub fn extract_fields(html: &str) -> ScrapedFields {
    let document = Html::parse_document(html);

    ScrapedFields {
        title: extract_title(&document),
        meta: extract_meta(&document),
        headings: extract_headings(&document),
        text: collect_visible_text(&document),
    }
}

/// Returns the visible text of a page with whitespace collapsed
///
/// Text inside `<head>`, `<script>`, `<style>`, `<noscript>` and
/// `<template>` is skipped.
pub fn visible_text(html: &str) -> String {
    collect_visible_text(&Html::parse_document(html))
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all followable anchor links from the HTML document
fn extract_anchor_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Extracts `<meta>` name/content pairs
fn extract_meta(document: &Html) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    let Ok(meta_selector) = Selector::parse("meta") else {
        return meta;
    };

    for element in document.select(&meta_selector) {
        let attrs = element.value();
        let name = attrs.attr("name").or_else(|| attrs.attr("property"));
        if let (Some(name), Some(content)) = (name, attrs.attr("content")) {
            meta.insert(name.to_string(), content.to_string());
        }
    }

    meta
}

/// Extracts h1-h3 heading text in document order
fn extract_headings(document: &Html) -> Vec<String> {
    let Ok(heading_selector) = Selector::parse("h1, h2, h3") else {
        return Vec::new();
    };

    document
        .select(&heading_selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
        .collect()
}

fn collect_visible_text(document: &Html) -> String {
    let mut out = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        for word in text.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }

    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a link href to an absolute, normalized URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    normalize_parsed(&mut absolute_url).ok()?;
    Some(absolute_url)
}
