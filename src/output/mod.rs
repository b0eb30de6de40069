//! Output module for crawl summaries and enriched records
//!
//! This module handles:
//! - Summarizing and printing crawl statistics
//! - Writing pipeline output as JSON lines

mod jsonl;
pub mod stats;

pub use jsonl::JsonLinesWriter;
pub use stats::{format_statistics, print_statistics, CrawlStatistics};
