//! Selective client-side rendering
//!
//! A cheap heuristic flags pages that probably need script execution; the
//! dispatcher hands those URLs to an external [`Renderer`] with bounded
//! concurrency.

mod dispatcher;
mod heuristic;

pub use dispatcher::{FetchRenderer, RenderDispatcher, RenderOutcome, RenderedPage, Renderer};
pub use heuristic::{needs_render, select_for_render, FetchSummary, EXCERPT_CHARS};

use thiserror::Error;

/// Errors reported for a single render
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Render of {url} timed out after {millis}ms")]
    Timeout { url: String, millis: u64 },

    #[error("Render of {url} failed: {message}")]
    Failed { url: String, message: String },

    #[error("Render task for {url} panicked")]
    Panicked { url: String },
}
