use crate::config::types::{Config, CrawlerConfig, PipelineConfig, RenderConfig, StageEntry};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_render_config(&config.render)?;
    validate_stages(&config.stages)?;
    validate_pipeline(&config.pipeline, &config.stages)?;
    Ok(())
}

/// Validates seed URLs
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }
    }
    Ok(())
}

/// Longest accepted inter-fetch delay (one hour)
const MAX_DELAY_SECS: f64 = 3600.0;

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if !config.delay.is_finite() || config.delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay must be a non-negative number of seconds, got {}",
            config.delay
        )));
    }

    if config.delay > MAX_DELAY_SECS {
        return Err(ConfigError::Validation(format!(
            "delay must be at most {} seconds, got {}",
            MAX_DELAY_SECS, config.delay
        )));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.allowed_domains.iter().any(|d| d.is_empty()) {
        return Err(ConfigError::Validation(
            "allowed_domains cannot contain empty entries".to_string(),
        ));
    }

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }

    Ok(())
}

/// Validates render dispatch configuration
fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "render concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "render timeout_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates stage declarations
fn validate_stages(stages: &[StageEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in stages {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Stage name cannot be empty".to_string(),
            ));
        }

        if entry.type_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Stage '{}' must name a type",
                entry.name
            )));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Stage '{}' is declared more than once",
                entry.name
            )));
        }
    }

    Ok(())
}

/// Validates that the pipeline only names declared stages
fn validate_pipeline(pipeline: &PipelineConfig, stages: &[StageEntry]) -> Result<(), ConfigError> {
    for name in &pipeline.order {
        if !stages.iter().any(|s| &s.name == name) {
            return Err(ConfigError::Validation(format!(
                "Pipeline references undeclared stage '{}'",
                name
            )));
        }
    }
    Ok(())
}
