use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Ripple-Pipeline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Seed URLs crawled when none are given on the command line
    #[serde(default)]
    pub seeds: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub render: RenderConfig,

    /// Stage declarations, registered in file order
    #[serde(default)]
    pub stages: Vec<StageEntry>,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Crawler behavior configuration
///
/// Immutable for the duration of one crawl call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum link-following depth from the seed (seed is depth 0)
    pub max_depth: u32,

    /// Maximum number of successfully fetched pages
    pub max_pages: usize,

    /// Fixed pause between fetches, in seconds
    pub delay: f64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-fetch timeout, in seconds
    pub timeout: u64,

    /// Follow links whose host differs from the page they were found on
    pub follow_external_links: bool,

    /// Host substrings; when non-empty only matching hosts are followed
    pub allowed_domains: Vec<String>,

    /// Extra request headers sent on every fetch
    pub headers: BTreeMap<String, String>,

    /// Consult robots.txt for each host before fetching from it
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 100,
            delay: 1.0,
            user_agent: "RippleBot/0.1.0".to_string(),
            timeout: 30,
            follow_external_links: false,
            allowed_domains: Vec::new(),
            headers: BTreeMap::new(),
            respect_robots: false,
        }
    }
}

impl CrawlerConfig {
    /// The inter-fetch delay as a [`Duration`]
    ///
    /// Negative or non-finite delays give zero; delays too large for a
    /// [`Duration`] saturate to [`Duration::MAX`].
    pub fn delay_duration(&self) -> Duration {
        if self.delay.is_finite() && self.delay > 0.0 {
            Duration::try_from_secs_f64(self.delay).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// The per-fetch timeout as a [`Duration`]
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Headers sent on every fetch
    ///
    /// The configured user agent is added as `User-Agent` unless the header
    /// table already carries one (compared case-insensitively).
    pub fn request_headers(&self) -> BTreeMap<String, String> {
        let mut headers = self.headers.clone();
        let has_agent = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("user-agent"));
        if !has_agent {
            headers.insert("User-Agent".to_string(), self.user_agent.clone());
        }
        headers
    }

    /// The product token of the user agent (`RippleBot/0.1.0` -> `RippleBot`)
    pub fn agent_token(&self) -> &str {
        self.user_agent
            .split('/')
            .next()
            .unwrap_or(&self.user_agent)
            .trim()
    }
}

/// Render dispatch configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Maximum renderer calls in flight
    pub concurrency: usize,

    /// Navigation timeout handed to the renderer, in milliseconds
    pub timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            timeout_ms: 15_000,
        }
    }
}

/// A stage declared in the configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StageEntry {
    /// Registry name the stage is registered under
    pub name: String,

    /// Catalog namespace the stage type lives in
    #[serde(default = "default_locator")]
    pub locator: String,

    /// Type name inside the namespace (e.g. "DataValidator")
    #[serde(rename = "type")]
    pub type_name: String,

    /// Overrides the `enabled` key of `options` when present
    pub enabled: Option<bool>,

    /// Stage-specific options, handed to the stage factory
    #[serde(default)]
    pub options: toml::Table,
}

fn default_locator() -> String {
    "builtin".to_string()
}

/// Pipeline ordering
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Stage names, executed in exactly this order
    #[serde(default)]
    pub order: Vec<String>,
}
