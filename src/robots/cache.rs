//! Per-host robots.txt cache
//!
//! Entries expire after 24 hours and are refetched on the next check.

use crate::crawler::FetchClient;
use crate::robots::{robots_url, ParsedRobots, RobotsPolicy};
use crate::url::extract_host;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Cached robots.txt data for one host
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub robots: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps `robots`, stamped with the current time
    pub fn new(robots: ParsedRobots) -> Self {
        Self {
            robots,
            fetched_at: Utc::now(),
        }
    }

    /// True once the entry is older than 24 hours
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Robots policy backed by robots.txt files fetched through a [`FetchClient`]
///
/// Call [`RobotsCache::ensure`] before [`RobotsPolicy::is_allowed`]; a host
/// that was never fetched is allowed.
#[derive(Debug, Clone)]
pub struct RobotsCache {
    agent: String,
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    /// Creates an empty cache matching rules for `agent` (the product token)
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            entries: HashMap::new(),
        }
    }

    /// Makes sure a fresh robots.txt for the host of `url` is cached
    ///
    /// Any fetch failure, including a 404, caches an allow-all entry so the
    /// host is not asked again until the entry expires.
    pub async fn ensure<F: FetchClient>(
        &mut self,
        fetcher: &F,
        url: &Url,
        headers: &BTreeMap<String, String>,
        timeout: std::time::Duration,
    ) {
        let Some(host) = extract_host(url) else {
            return;
        };
        if self.entries.get(&host).is_some_and(|cached| !cached.is_stale()) {
            return;
        }
        let Some(target) = robots_url(url) else {
            return;
        };

        let robots = match fetcher.fetch(target.as_str(), headers, timeout).await {
            Ok(response) => {
                tracing::debug!("Fetched robots.txt for {}", host);
                ParsedRobots::from_content(&response.body)
            }
            Err(e) => {
                tracing::debug!("No usable robots.txt for {}: {}", host, e);
                ParsedRobots::allow_all()
            }
        };

        self.insert(host, robots);
    }

    /// Stores `robots` for `host`, replacing any previous entry
    pub fn insert(&mut self, host: impl Into<String>, robots: ParsedRobots) {
        self.entries.insert(host.into(), CachedRobots::new(robots));
    }

    pub fn get(&self, host: &str) -> Option<&CachedRobots> {
        self.entries.get(host)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RobotsPolicy for RobotsCache {
    fn is_allowed(&self, url: &Url) -> bool {
        let Some(host) = extract_host(url) else {
            return true;
        };
        match self.entries.get(&host) {
            Some(cached) => cached.robots.is_allowed(url.as_str(), &self.agent),
            None => true,
        }
    }
}
