use crate::config::types::{Config, StageEntry};
use crate::config::validation::validate;
use crate::pipeline::StageConfig;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Printed at startup so two runs can be compared at a glance.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Converts a stage entry's TOML options into the JSON mapping stages consume
///
/// The entry-level `enabled` flag, when given, wins over an `enabled` key
/// inside `options`.
pub fn stage_options(entry: &StageEntry) -> Result<StageConfig, ConfigError> {
    let value = serde_json::to_value(&entry.options).map_err(|e| {
        ConfigError::Validation(format!("Stage '{}' has unusable options: {}", entry.name, e))
    })?;

    let mut options = match value {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(ConfigError::Validation(format!(
                "Stage '{}' options must be a table, got {}",
                entry.name, other
            )))
        }
    };

    if let Some(enabled) = entry.enabled {
        options.insert("enabled".to_string(), serde_json::Value::Bool(enabled));
    }

    Ok(options)
}
