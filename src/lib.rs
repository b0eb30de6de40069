//! Ripple-Pipeline: a breadth-first crawl frontier feeding a pluggable record pipeline
//!
//! Pages are discovered by a single-threaded, polite frontier crawler, turned into
//! open-ended records, and threaded through an ordered list of named processing
//! stages. Pages that look client-rendered can be handed to an external renderer
//! through a bounded-concurrency dispatcher.

pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod robots;
pub mod stages;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-Pipeline operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] pipeline::PipelineError),

    #[error("Stage loading error: {0}")]
    Load(#[from] pipeline::LoadError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Ripple-Pipeline operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlerConfig};
pub use crawler::{CrawlStats, Crawler, PageRecord};
pub use pipeline::{Payload, PipelineRecord, Stage, StageRegistry};
pub use render::{needs_render, FetchSummary, RenderDispatcher};
pub use url::{extract_host, normalize_url, LinkPolicy};
