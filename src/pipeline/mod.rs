//! Pluggable record pipeline
//!
//! Records flow through named [`Stage`]s held by a [`StageRegistry`]. Stages
//! are registered directly or loaded by locator and type name from a
//! [`StageCatalog`].

mod catalog;
mod payload;
mod registry;
mod stage;

pub use catalog::{CatalogEntry, Namespace, StageCatalog, StageFactory, TransformHook};
pub use payload::{Payload, PipelineRecord};
pub use registry::{StageDescriptor, StageRegistry};
pub use stage::{option_or, Stage, StageError, StageInfo};

use thiserror::Error;

/// Configuration handed to a stage
pub type StageConfig = serde_json::Map<String, serde_json::Value>;

/// Errors raised while executing stages
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stage '{0}' not found")]
    StageNotFound(String),

    #[error("Stage '{0}' is not enabled")]
    StageDisabled(String),

    #[error("Stage '{name}' failed: {source}")]
    StageFailed {
        name: String,
        #[source]
        source: StageError,
    },
}

/// Errors raised while loading a stage from the catalog
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Locator not found: {0}")]
    LocatorNotFound(String),

    #[error("Type '{type_name}' not found in {locator}")]
    TypeNotFound { locator: String, type_name: String },

    #[error("'{type_name}' in {locator} is a {found}, not a stage")]
    ContractViolation {
        locator: String,
        type_name: String,
        found: &'static str,
    },

    #[error("Failed to instantiate {type_name}: {source}")]
    InstantiationFailure {
        type_name: String,
        #[source]
        source: StageError,
    },
}
