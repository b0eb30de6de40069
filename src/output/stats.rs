//! Crawl statistics
//!
//! Turns the result of one crawl into a summary and prints it.

use crate::crawler::{CrawlStats, FetchError, PageRecord, SkipReason, SkippedEntry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStatistics {
    pub seed: String,

    /// Counters reported by the crawler
    pub counters: CrawlStats,

    /// Pages fetched at each depth
    pub pages_by_depth: BTreeMap<u32, usize>,

    /// Pages fetched per HTTP status
    pub pages_by_status: BTreeMap<u16, usize>,

    /// Skipped entries grouped by reason kind
    pub skip_summary: BTreeMap<String, usize>,

    /// Total body bytes fetched
    pub content_bytes: usize,
}

impl CrawlStatistics {
    pub fn from_crawl(
        seed: &str,
        records: &[PageRecord],
        counters: CrawlStats,
        skipped: &[SkippedEntry],
    ) -> Self {
        let mut stats = Self {
            seed: seed.to_string(),
            counters,
            ..Self::default()
        };

        for record in records {
            *stats.pages_by_depth.entry(record.depth).or_default() += 1;
            *stats.pages_by_status.entry(record.status_code).or_default() += 1;
            stats.content_bytes += record.content.len();
        }

        for entry in skipped {
            *stats.skip_summary.entry(skip_kind(&entry.reason)).or_default() += 1;
        }

        stats
    }
}

fn skip_kind(reason: &SkipReason) -> String {
    match reason {
        SkipReason::RobotsDenied => "robots.txt".to_string(),
        SkipReason::Fetch(FetchError::HttpStatus { status, .. }) => format!("http {}", status),
        SkipReason::Fetch(FetchError::Timeout { .. }) => "timeout".to_string(),
        SkipReason::Fetch(FetchError::Network { .. }) => "network".to_string(),
        SkipReason::Fetch(FetchError::Body { .. }) => "body".to_string(),
    }
}

/// Renders statistics as the text printed by [`print_statistics`]
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Crawl Statistics: {} ===\n", stats.seed);

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Pages fetched: {}", stats.counters.results);
    let _ = writeln!(out, "  Entries skipped: {}", stats.counters.skipped);
    let _ = writeln!(out, "  Left in frontier: {}", stats.counters.frontier);
    let _ = writeln!(out, "  Content bytes: {}", stats.content_bytes);
    let _ = writeln!(out);

    if !stats.pages_by_depth.is_empty() {
        let _ = writeln!(out, "Pages by Depth:");
        for (depth, count) in &stats.pages_by_depth {
            let _ = writeln!(out, "  {}: {}", depth, count);
        }
        let _ = writeln!(out);
    }

    if !stats.pages_by_status.is_empty() {
        let _ = writeln!(out, "Pages by Status:");
        for (status, count) in &stats.pages_by_status {
            let _ = writeln!(out, "  {}: {}", status, count);
        }
        let _ = writeln!(out);
    }

    if !stats.skip_summary.is_empty() {
        let _ = writeln!(out, "Skipped:");
        let mut reasons: Vec<_> = stats.skip_summary.iter().collect();
        reasons.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (reason, count) in reasons {
            let _ = writeln!(out, "  {}: {}", reason, count);
        }
        let _ = writeln!(out);
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    print!("{}", format_statistics(stats));
}
