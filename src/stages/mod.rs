//! Built-in pipeline stages
//!
//! Every stage enriches the record under its own key:
//!
//! | Type                 | Key          |
//! |----------------------|--------------|
//! | `DataValidator`      | `validation` |
//! | `DataTransformer`    | whole record |
//! | `RateLimiter`        | `rate_limit` |
//! | `TaxonomyClassifier` | `taxonomy`   |
//! | `RecordStore`        | `storage`    |
//! | `GatewayRouter`      | `gateway`    |
//! | `BuildTrigger`       | `build`      |

mod build_trigger;
mod gateway;
mod rate_limiter;
mod record_store;
mod taxonomy;
mod transformer;
mod validator;

pub use build_trigger::BuildTrigger;
pub use gateway::{GatewayRouter, RouteRule};
pub use rate_limiter::{RateLimitStats, RateLimiter};
pub use record_store::RecordStore;
pub use taxonomy::TaxonomyClassifier;
pub use transformer::{drop_content, trim_strings, DataTransformer, Transformation};
pub use validator::DataValidator;

use crate::config::{stage_options, Config};
use crate::pipeline::{StageCatalog, StageRegistry};
use crate::CrawlError;

/// Locator of the built-in namespace
pub const BUILTIN: &str = "builtin";

/// Catalog holding every built-in stage and transform hook under `builtin`
pub fn builtin_catalog() -> StageCatalog {
    let mut catalog = StageCatalog::new();
    catalog
        .register_stage(BUILTIN, "DataValidator", DataValidator::factory)
        .register_stage(BUILTIN, "DataTransformer", DataTransformer::factory)
        .register_stage(BUILTIN, "RateLimiter", RateLimiter::factory)
        .register_stage(BUILTIN, "TaxonomyClassifier", TaxonomyClassifier::factory)
        .register_stage(BUILTIN, "RecordStore", RecordStore::factory)
        .register_stage(BUILTIN, "GatewayRouter", GatewayRouter::factory)
        .register_stage(BUILTIN, "BuildTrigger", BuildTrigger::factory)
        .register_transform(BUILTIN, "drop_content", drop_content)
        .register_transform(BUILTIN, "trim_strings", trim_strings);
    catalog
}

/// Loads every `[[stages]]` entry of `config` into a fresh registry
///
/// Stages are loaded in declaration order; the first failure is returned and
/// the stages loaded so far are cleaned up.
pub fn build_registry(config: &Config) -> Result<StageRegistry, CrawlError> {
    let mut registry = StageRegistry::with_catalog(builtin_catalog());

    for entry in &config.stages {
        let loaded = stage_options(entry).map_err(CrawlError::from).and_then(|options| {
            registry
                .load_from_descriptor(&entry.name, &entry.locator, &entry.type_name, Some(options))
                .map_err(CrawlError::from)
        });

        if let Err(e) = loaded {
            registry.cleanup_all();
            return Err(e);
        }
    }

    Ok(registry)
}

/// Stage names to run, in order
///
/// `[pipeline] order` wins; without it every declared stage runs in
/// declaration order.
pub fn pipeline_order(config: &Config) -> Vec<String> {
    if config.pipeline.order.is_empty() {
        config.stages.iter().map(|s| s.name.clone()).collect()
    } else {
        config.pipeline.order.clone()
    }
}
