//! Crawler coordinator - main crawl loop
//!
//! One fetch is in flight at a time. Each iteration pops the oldest frontier
//! entry, optionally checks robots.txt, fetches, records the page and
//! enqueues the links it allows, then sleeps for the configured delay.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchClient, FetchError, FetchResponse, ReqwestFetcher};
use crate::crawler::parser::extract_links;
use crate::crawler::record::PageRecord;
use crate::crawler::scheduler::{Frontier, FrontierEntry};
use crate::robots::{RobotsCache, RobotsPolicy};
use crate::url::{normalize_url, LinkPolicy};
use crate::CrawlError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Why a frontier entry produced no page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Fetch(FetchError),
    RobotsDenied,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "{}", e),
            Self::RobotsDenied => write!(f, "disallowed by robots.txt"),
        }
    }
}

/// A frontier entry that was popped but not recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub url: String,
    pub depth: u32,
    pub reason: SkipReason,
}

/// Counters describing the current or last crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Successfully fetched URLs
    pub visited: usize,
    /// Entries still queued
    pub frontier: usize,
    /// Page records produced
    pub results: usize,
    /// Entries dropped after a failed fetch or a robots denial
    pub skipped: usize,
}

enum RobotsGate {
    Cache(RobotsCache),
    Policy(Box<dyn RobotsPolicy + Send + Sync>),
}

/// Breadth-first crawler over a single seed
///
/// The crawler is generic over its [`FetchClient`] so tests can drive it
/// without a network.
pub struct Crawler<F: FetchClient> {
    config: CrawlerConfig,
    fetcher: F,
    policy: LinkPolicy,
    robots: RobotsGate,
    frontier: Frontier,
    skipped: Vec<SkippedEntry>,
    pages_recorded: usize,
}

impl Crawler<ReqwestFetcher> {
    /// Creates a crawler backed by a reqwest client built from `config`
    pub fn from_config(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = ReqwestFetcher::new(&config)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: FetchClient> Crawler<F> {
    /// Creates a crawler using `fetcher` for every request
    pub fn new(config: CrawlerConfig, fetcher: F) -> Self {
        let policy = LinkPolicy::from_config(&config);
        let robots = RobotsGate::Cache(RobotsCache::new(config.agent_token()));
        let frontier = Frontier::new(config.max_depth, config.max_pages);

        Self {
            config,
            fetcher,
            policy,
            robots,
            frontier,
            skipped: Vec::new(),
            pages_recorded: 0,
        }
    }

    /// Replaces the robots.txt cache with a fixed policy
    ///
    /// The policy is only consulted when `respect_robots` is enabled.
    pub fn with_robots(mut self, policy: impl RobotsPolicy + Send + Sync + 'static) -> Self {
        self.robots = RobotsGate::Policy(Box::new(policy));
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawls breadth-first from `seed` and returns the fetched pages
    ///
    /// Failed fetches are logged and recorded in [`Crawler::skipped`]; they
    /// never abort the crawl, so the result may cover only part of the
    /// reachable graph. An invalid seed fails before any request is made.
    ///
    /// Each call starts from an empty frontier and visited set.
    pub async fn crawl(&mut self, seed: &str) -> Result<Vec<PageRecord>, CrawlError> {
        let seed = normalize_url(seed)?;

        self.frontier = Frontier::seeded(seed.clone(), self.config.max_depth, self.config.max_pages);
        self.skipped.clear();
        self.pages_recorded = 0;

        let headers = self.config.request_headers();
        let timeout = self.config.timeout_duration();
        let delay = self.config.delay_duration();
        let mut results = Vec::new();

        tracing::info!(
            "Starting crawl from {} (max depth {}, max pages {})",
            seed,
            self.config.max_depth,
            self.config.max_pages
        );

        while let Some(entry) = self.frontier.next_entry() {
            if self.config.respect_robots && !self.robots_allow(&entry.url, &headers, timeout).await
            {
                self.skip(entry, SkipReason::RobotsDenied);
                continue;
            }

            tracing::debug!("Fetching {} (depth {})", entry.url, entry.depth);

            let outcome = self.fetcher.fetch(entry.url.as_str(), &headers, timeout).await;
            match outcome {
                Ok(response) => results.push(self.record_page(&entry, response)),
                Err(e) => self.skip(entry, SkipReason::Fetch(e)),
            }

            if !self.frontier.is_finished() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let stats = self.stats();
        tracing::info!(
            "Crawl finished: {} pages, {} skipped, {} left in frontier",
            stats.results,
            stats.skipped,
            stats.frontier
        );

        Ok(results)
    }

    /// Returns counters for the current or last crawl
    pub fn stats(&self) -> CrawlStats {
        CrawlStats {
            visited: self.frontier.visited_count(),
            frontier: self.frontier.len(),
            results: self.pages_recorded,
            skipped: self.skipped.len(),
        }
    }

    /// Entries dropped during the last crawl, in the order they were popped
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    fn record_page(&mut self, entry: &FrontierEntry, response: FetchResponse) -> PageRecord {
        let record = PageRecord::from_response(entry.url.as_str(), entry.depth, response);
        self.frontier.mark_visited(&entry.url);
        self.pages_recorded += 1;

        if entry.depth < self.frontier.max_depth() {
            let mut queued = 0;
            for link in extract_links(&record.content, &entry.url, &self.policy) {
                if self.frontier.enqueue(link, entry.depth + 1) {
                    queued += 1;
                }
            }
            tracing::debug!("Queued {} links from {}", queued, entry.url);
        }

        record
    }

    fn skip(&mut self, entry: FrontierEntry, reason: SkipReason) {
        tracing::warn!("Skipping {} (depth {}): {}", entry.url, entry.depth, reason);
        self.skipped.push(SkippedEntry {
            url: entry.url.to_string(),
            depth: entry.depth,
            reason,
        });
    }

    async fn robots_allow(
        &mut self,
        url: &Url,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> bool {
        match &mut self.robots {
            RobotsGate::Policy(policy) => policy.is_allowed(url),
            RobotsGate::Cache(cache) => {
                cache.ensure(&self.fetcher, url, headers, timeout).await;
                cache.is_allowed(url)
            }
        }
    }
}
