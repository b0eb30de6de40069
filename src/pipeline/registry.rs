//! Stage registry and pipeline executor
//!
//! Stages run synchronously on the caller's thread, one record at a time
//! through the requested names. Async callers should go through
//! [`StageRegistry::execute_pipeline_in_place`] so a stage that blocks
//! (such as the rate limiter) does not stall the runtime.

use crate::pipeline::{
    LoadError, Payload, PipelineError, Stage, StageCatalog, StageConfig, StageInfo,
};
use std::collections::BTreeMap;

/// A registered stage
pub struct StageDescriptor {
    pub name: String,
    pub stage: Box<dyn Stage>,
    /// Configuration passed at registration (empty when none was given)
    pub config: StageConfig,
    pub enabled: bool,
}

impl std::fmt::Debug for StageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageDescriptor")
            .field("name", &self.name)
            .field("stage", &self.stage.name())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Named stages with ordered, fail-fast execution
///
/// Stages run on the caller's thread and take `&mut self`; share a registry
/// between tasks by wrapping it in a mutex.
#[derive(Debug, Default)]
pub struct StageRegistry {
    stages: Vec<StageDescriptor>,
    catalog: StageCatalog,
}

impl StageRegistry {
    /// Creates a registry with an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that loads stages from `catalog`
    pub fn with_catalog(catalog: StageCatalog) -> Self {
        Self {
            stages: Vec::new(),
            catalog,
        }
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut StageCatalog {
        &mut self.catalog
    }

    /// Registers `stage` under `name`
    ///
    /// An existing stage with the same name is replaced in place, keeping its
    /// position in [`StageRegistry::list`]; the replaced instance is dropped
    /// without `cleanup`. Enabled stages are initialized; a `false` result is
    /// logged and the stage stays registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        mut stage: Box<dyn Stage>,
        config: Option<StageConfig>,
    ) {
        let name = name.into();
        let enabled = stage.enabled();

        if enabled && !stage.initialize() {
            tracing::warn!("Stage {} ({}) failed to initialize", name, stage.name());
        }

        let descriptor = StageDescriptor {
            name,
            stage,
            config: config.unwrap_or_default(),
            enabled,
        };

        match self.position(&descriptor.name) {
            Some(index) => {
                tracing::debug!("Replacing stage {}", descriptor.name);
                self.stages[index] = descriptor;
            }
            None => {
                tracing::debug!("Registered stage {}", descriptor.name);
                self.stages.push(descriptor);
            }
        }
    }

    /// Cleans up and removes the stage called `name`
    ///
    /// Returns false if no such stage was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(index) = self.position(name) else {
            return false;
        };
        let mut descriptor = self.stages.remove(index);
        descriptor.stage.cleanup();
        tracing::debug!("Unregistered stage {}", name);
        true
    }

    pub fn get(&self, name: &str) -> Option<&dyn Stage> {
        let descriptor = self.stages.iter().find(|d| d.name == name)?;
        Some(descriptor.stage.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn Stage> {
        let descriptor = self.stages.iter_mut().find(|d| d.name == name)?;
        Some(descriptor.stage.as_mut())
    }

    pub fn descriptor(&self, name: &str) -> Option<&StageDescriptor> {
        self.stages.iter().find(|d| d.name == name)
    }

    /// Registered names in registration order
    pub fn list(&self) -> Vec<&str> {
        self.stages.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Info for every registered stage, keyed by registered name
    pub fn info_all(&self) -> BTreeMap<String, StageInfo> {
        self.stages
            .iter()
            .map(|d| (d.name.clone(), d.stage.info()))
            .collect()
    }

    /// Runs one stage
    pub fn execute(&mut self, name: &str, payload: Payload) -> Result<Payload, PipelineError> {
        let descriptor = self
            .stages
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| PipelineError::StageNotFound(name.to_string()))?;

        if !descriptor.enabled {
            return Err(PipelineError::StageDisabled(name.to_string()));
        }

        tracing::debug!("Executing stage {}", name);
        descriptor
            .stage
            .execute(payload)
            .map_err(|source| PipelineError::StageFailed {
                name: name.to_string(),
                source,
            })
    }

    /// Runs `names` in order, feeding each output into the next stage
    ///
    /// The first error aborts the run; later stages are never invoked and no
    /// partial output is returned.
    pub fn execute_pipeline<S: AsRef<str>>(
        &mut self,
        names: &[S],
        payload: Payload,
    ) -> Result<Payload, PipelineError> {
        names
            .iter()
            .try_fold(payload, |current, name| self.execute(name.as_ref(), current))
    }

    /// Runs [`StageRegistry::execute_pipeline`] from inside a tokio runtime
    ///
    /// Uses `block_in_place`, so the worker's other tasks move to another
    /// thread while the stages run. Requires the multi-threaded runtime.
    pub fn execute_pipeline_in_place<S: AsRef<str>>(
        &mut self,
        names: &[S],
        payload: Payload,
    ) -> Result<Payload, PipelineError> {
        tokio::task::block_in_place(|| self.execute_pipeline(names, payload))
    }

    /// Builds a stage from the catalog and registers it under `name`
    ///
    /// Nothing is registered when any step fails.
    pub fn load_from_descriptor(
        &mut self,
        name: &str,
        locator: &str,
        type_name: &str,
        config: Option<StageConfig>,
    ) -> Result<(), LoadError> {
        let (factory, namespace) = self.catalog.resolve(locator, type_name)?;

        let stage = factory(config.clone().unwrap_or_default(), namespace).map_err(|source| {
            LoadError::InstantiationFailure {
                type_name: type_name.to_string(),
                source,
            }
        })?;

        tracing::debug!("Loaded {}/{} as {}", locator, type_name, name);
        self.register(name, stage, config);
        Ok(())
    }

    /// Cleans up every stage, then empties the registry
    pub fn cleanup_all(&mut self) {
        for descriptor in &mut self.stages {
            descriptor.stage.cleanup();
        }
        self.stages.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|d| d.name == name)
    }
}
