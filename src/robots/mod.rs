//! Robots.txt handling module
//!
//! The crawler consults a [`RobotsPolicy`] before each fetch when
//! `respect-robots` is enabled. [`RobotsCache`] is the default policy and
//! fetches robots.txt through the same fetch client as pages.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use url::Url;

/// Decides whether a URL may be fetched
pub trait RobotsPolicy {
    fn is_allowed(&self, url: &Url) -> bool;
}

/// Policy that never denies anything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RobotsPolicy for AllowAll {
    fn is_allowed(&self, _url: &Url) -> bool {
        true
    }
}

/// Policy backed by one fixed robots.txt body, applied to every host
#[derive(Debug, Clone)]
pub struct StaticRobots {
    robots: ParsedRobots,
    agent: String,
}

impl StaticRobots {
    pub fn new(content: &str, agent: impl Into<String>) -> Self {
        Self {
            robots: ParsedRobots::from_content(content),
            agent: agent.into(),
        }
    }
}

impl RobotsPolicy for StaticRobots {
    fn is_allowed(&self, url: &Url) -> bool {
        self.robots.is_allowed(url.as_str(), &self.agent)
    }
}

/// Returns the robots.txt URL for the origin of `url`
///
/// # Example
///
/// ```
/// use ripple_pipeline::robots::robots_url;
/// use url::Url;
///
/// let page = Url::parse("https://example.com:8443/docs/page?q=1").unwrap();
/// assert_eq!(
///     robots_url(&page).unwrap().as_str(),
///     "https://example.com:8443/robots.txt"
/// );
/// ```
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    url.join("/robots.txt").ok()
}
