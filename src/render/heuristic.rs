//! Render-need heuristic
//!
//! Decides from a cheap fetch summary whether a page probably relies on
//! client-side scripts for its content.

use crate::crawler::{visible_text, FetchResponse};
use serde::Serialize;
use std::collections::BTreeMap;

/// Characters of visible text kept in a summary excerpt
pub const EXCERPT_CHARS: usize = 1000;

const LARGE_PAGE_BYTES: u64 = 10_000;
const THIN_TEXT_CHARS: usize = 500;

/// What the render heuristic looks at for one fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    /// Page size in bytes
    pub content_length: Option<u64>,
    /// Leading text of the page
    pub text_excerpt: Option<String>,
}

impl FetchSummary {
    pub fn new(content_length: u64, text_excerpt: impl Into<String>) -> Self {
        Self {
            content_length: Some(content_length),
            text_excerpt: Some(text_excerpt.into()),
        }
    }

    /// Summarizes a fetch response
    ///
    /// The length comes from `Content-Length` when the server sent a valid
    /// one, else from the body. The excerpt is the first
    /// [`EXCERPT_CHARS`] characters of visible text.
    pub fn from_response(response: &FetchResponse) -> Self {
        Self::from_parts(&response.body, &response.headers)
    }

    /// Summarizes a page from its body and response headers
    pub fn from_parts(body: &str, headers: &BTreeMap<String, String>) -> Self {
        let content_length = headers
            .get("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(body.len() as u64);

        let excerpt: String = visible_text(body).chars().take(EXCERPT_CHARS).collect();

        Self::new(content_length, excerpt)
    }
}

/// Guesses whether a page needs client-side rendering to show its content
///
/// True when the page is large but carries little text, or when the
/// excerpt mentions a `<script` tag. Missing fields count as zero or empty.
///
/// ```
/// use ripple_pipeline::{needs_render, FetchSummary};
///
/// assert!(needs_render(&FetchSummary::new(5, "<script>x</script>")));
/// assert!(!needs_render(&FetchSummary::new(20_000, "a".repeat(600))));
/// ```
pub fn needs_render(summary: &FetchSummary) -> bool {
    let excerpt = summary
        .text_excerpt
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let content_length = summary.content_length.unwrap_or(0);

    if content_length > LARGE_PAGE_BYTES && excerpt.chars().count() < THIN_TEXT_CHARS {
        return true;
    }
    excerpt.contains("<script")
}

/// Returns the URLs whose summaries call for rendering, in input order
pub fn select_for_render<I>(summaries: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, FetchSummary)>,
{
    summaries
        .into_iter()
        .filter(|(_, summary)| needs_render(summary))
        .map(|(url, _)| url)
        .collect()
}
