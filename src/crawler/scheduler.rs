//! Frontier for a single breadth-first crawl
//!
//! This module handles:
//! - The FIFO queue of URLs waiting to be fetched
//! - The visited set of successfully fetched URLs
//! - Depth and page-budget bounds
//!
//! The frontier never sleeps or fetches; the coordinator drives it.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL to fetch
    pub url: Url,

    /// Link distance from the seed (seed is 0)
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Frontier manages the crawl queue and the visited set
///
/// Entries leave the queue in insertion order, which makes the traversal
/// breadth-first. Only successfully fetched URLs count as visited, so a URL
/// may sit in the queue more than once until one of its copies is fetched.
#[derive(Debug, Clone)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    max_depth: u32,
    max_pages: usize,
}

impl Frontier {
    /// Creates an empty frontier with the given bounds
    pub fn new(max_depth: u32, max_pages: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            max_depth,
            max_pages,
        }
    }

    /// Creates a frontier holding only `seed` at depth 0
    pub fn seeded(seed: Url, max_depth: u32, max_pages: usize) -> Self {
        let mut frontier = Self::new(max_depth, max_pages);
        frontier.queue.push_back(FrontierEntry::new(seed, 0));
        frontier
    }

    /// Pops the next entry worth fetching
    ///
    /// Entries that are already visited or deeper than `max_depth` are
    /// discarded on the way. Returns None once the queue is drained or the
    /// page budget is spent.
    pub fn next_entry(&mut self) -> Option<FrontierEntry> {
        while !self.budget_exhausted() {
            let entry = self.queue.pop_front()?;

            if self.visited.contains(entry.url.as_str()) {
                tracing::trace!("Already visited: {}", entry.url);
                continue;
            }
            if entry.depth > self.max_depth {
                tracing::trace!("Too deep ({}): {}", entry.depth, entry.url);
                continue;
            }

            return Some(entry);
        }
        None
    }

    /// Queues `url` at `depth` unless it was already fetched
    ///
    /// Returns true if the entry was queued.
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        if self.visited.contains(url.as_str()) {
            return false;
        }
        self.queue.push_back(FrontierEntry::new(url, depth));
        true
    }

    /// Records a successful fetch of `url`
    ///
    /// Returns false if the URL was already visited.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// True when there is nothing left that could be fetched
    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() || self.budget_exhausted()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.visited.len() >= self.max_pages
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of visited URLs
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://a.test{}", path)).unwrap()
    }

    #[test]
    fn test_new_frontier() {
        let frontier = Frontier::new(3, 10);
        assert!(frontier.is_empty());
        assert!(frontier.is_finished());
        assert_eq!(frontier.visited_count(), 0);
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::seeded(url("/"), 3, 10);
        frontier.enqueue(url("/a"), 1);
        frontier.enqueue(url("/b"), 1);

        assert_eq!(frontier.next_entry().unwrap().url, url("/"));
        assert_eq!(frontier.next_entry().unwrap().url, url("/a"));
        assert_eq!(frontier.next_entry().unwrap().url, url("/b"));
        assert!(frontier.next_entry().is_none());
    }

    #[test]
    fn test_visited_entries_skipped() {
        let mut frontier = Frontier::new(3, 10);
        frontier.enqueue(url("/a"), 1);
        frontier.enqueue(url("/a"), 2);
        frontier.enqueue(url("/b"), 1);

        let first = frontier.next_entry().unwrap();
        assert!(frontier.mark_visited(&first.url));

        // The second copy of /a is dropped on the way to /b
        assert_eq!(frontier.next_entry().unwrap().url, url("/b"));
    }

    #[test]
    fn test_enqueue_rejects_visited() {
        let mut frontier = Frontier::new(3, 10);
        frontier.mark_visited(&url("/a"));

        assert!(!frontier.enqueue(url("/a"), 1));
        assert!(frontier.enqueue(url("/b"), 1));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_too_deep_entries_skipped() {
        let mut frontier = Frontier::new(1, 10);
        frontier.enqueue(url("/deep"), 2);
        frontier.enqueue(url("/ok"), 1);

        assert_eq!(frontier.next_entry().unwrap().url, url("/ok"));
        assert!(frontier.next_entry().is_none());
    }

    #[test]
    fn test_page_budget() {
        let mut frontier = Frontier::seeded(url("/"), 3, 1);
        frontier.enqueue(url("/a"), 1);

        let seed = frontier.next_entry().unwrap();
        frontier.mark_visited(&seed.url);

        assert!(frontier.budget_exhausted());
        assert!(frontier.is_finished());
        assert!(frontier.next_entry().is_none());
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_mark_visited_twice() {
        let mut frontier = Frontier::new(3, 10);
        assert!(frontier.mark_visited(&url("/a")));
        assert!(!frontier.mark_visited(&url("/a")));
        assert_eq!(frontier.visited_count(), 1);
        assert!(frontier.is_visited(&url("/a")));
    }
}
