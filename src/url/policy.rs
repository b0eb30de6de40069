use crate::config::CrawlerConfig;
use crate::url::extract_host;
use url::Url;

/// Decides which discovered links the crawler may follow
///
/// Rules, applied in order:
/// 1. Only `http` and `https` links are followed
/// 2. With `follow_external_links` off, the link's host must equal the host of
///    the page it was found on (not the seed's host)
/// 3. With a non-empty `allowed_domains`, the link's host must contain at least
///    one of the configured substrings
///
/// The allowed-domain check is a plain substring test, not suffix-anchored:
/// `"example.com"` also admits `notexample.com.evil.net`. Callers that want an
/// exact domain must supply a specific enough substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPolicy {
    pub follow_external_links: bool,
    pub allowed_domains: Vec<String>,
}

impl LinkPolicy {
    /// Builds the policy from crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            follow_external_links: config.follow_external_links,
            allowed_domains: config
                .allowed_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        }
    }

    /// Returns true if `link`, found on `source`, may be followed
    pub fn allows(&self, source: &Url, link: &Url) -> bool {
        if link.scheme() != "http" && link.scheme() != "https" {
            return false;
        }

        let Some(link_host) = extract_host(link) else {
            return false;
        };

        if !self.follow_external_links && extract_host(source).as_deref() != Some(&link_host) {
            return false;
        }

        if !self.allowed_domains.is_empty()
            && !self
                .allowed_domains
                .iter()
                .any(|domain| link_host.contains(domain.as_str()))
        {
            return false;
        }

        true
    }
}
