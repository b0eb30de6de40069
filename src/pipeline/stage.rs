//! The stage contract
//!
//! A stage owns its configuration and goes through `initialize`, any number
//! of `execute` calls, then `cleanup`.

use crate::pipeline::{Payload, StageConfig};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by a stage's own `execute`
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid stage configuration: {0}")]
    Config(String),

    #[error("Stage is not initialized")]
    NotInitialized,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

/// Introspection snapshot of a stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageInfo {
    /// Stage kind, e.g. `DataValidator`
    pub name: String,
    pub enabled: bool,
    pub config: StageConfig,
}

/// A processing step in the record pipeline
///
/// Lifecycle: `initialize` once after registration (enabled stages only),
/// `execute` any number of times, `cleanup` once on unregistration.
pub trait Stage: Send {
    /// Kind name reported by [`Stage::info`]
    fn name(&self) -> &str;

    /// Configuration the stage was built with
    fn config(&self) -> &StageConfig;

    /// Reads the `enabled` key of the configuration (default true)
    fn enabled(&self) -> bool {
        self.config()
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Prepares resources; returns false if the stage is not usable
    fn initialize(&mut self) -> bool;

    fn execute(&mut self, payload: Payload) -> Result<Payload, StageError>;

    /// Releases resources
    fn cleanup(&mut self);

    fn info(&self) -> StageInfo {
        StageInfo {
            name: self.name().to_string(),
            enabled: self.enabled(),
            config: self.config().clone(),
        }
    }
}

/// Reads an optional typed option from a stage configuration
///
/// A missing key or `null` yields `default`; a value of the wrong type is a
/// configuration error.
pub fn option_or<T: serde::de::DeserializeOwned>(
    config: &StageConfig,
    key: &str,
    default: T,
) -> Result<T, StageError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| StageError::Config(format!("{}: {}", key, e))),
    }
}
