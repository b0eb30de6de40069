//! Configuration module for Ripple-Pipeline
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ripple_pipeline::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripple.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, PipelineConfig, RenderConfig, StageEntry};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, stage_options};
