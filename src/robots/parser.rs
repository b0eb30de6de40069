//! Robots.txt parser implementation
//!
//! Matching is delegated to the robotstxt crate (a port of Google's parser).

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// The body is kept as text and matched on demand; `DefaultMatcher` is cheap
/// to build and holds no state between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRobots {
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when robots.txt is missing or unreachable.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if `url` may be fetched by `agent`
    ///
    /// `url` may be absolute or a bare path. `agent` is the product token
    /// (e.g. `RippleBot`), not the full user-agent header.
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }
}
