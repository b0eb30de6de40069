//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The fetch client seam and its reqwest implementation
//! - HTML parsing, link extraction and field scraping
//! - The breadth-first frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod record;
mod scheduler;

pub use coordinator::{CrawlStats, Crawler, SkipReason, SkippedEntry};
pub use fetcher::{build_http_client, FetchClient, FetchError, FetchResponse, ReqwestFetcher};
pub use parser::{extract_fields, extract_links, parse_html, visible_text, ParsedPage, ScrapedFields};
pub use record::PageRecord;
pub use scheduler::{Frontier, FrontierEntry};
