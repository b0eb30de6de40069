//! Compile-time catalog of stage factories and transform hooks
//!
//! Entries are addressed by a locator (a namespace such as `builtin`) and a
//! type name inside it. The catalog replaces loading code by path at
//! runtime: everything that can be loaded is registered up front.

use crate::pipeline::{LoadError, PipelineRecord, Stage, StageConfig, StageError};
use std::collections::BTreeMap;

/// Builds a stage from its configuration
///
/// The namespace the factory was found in is passed along so a stage can
/// resolve hooks registered next to it.
pub type StageFactory = fn(StageConfig, &Namespace) -> Result<Box<dyn Stage>, StageError>;

/// Whole-record rewrite applied by the transformer stage
pub type TransformHook = fn(PipelineRecord) -> PipelineRecord;

#[derive(Clone, Copy)]
pub enum CatalogEntry {
    Stage(StageFactory),
    Transform(TransformHook),
}

impl CatalogEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stage(_) => "stage",
            Self::Transform(_) => "transform",
        }
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogEntry::{}", self.kind())
    }
}

/// Entries registered under one locator
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Namespace {
    pub fn insert(&mut self, type_name: impl Into<String>, entry: CatalogEntry) {
        self.entries.insert(type_name.into(), entry);
    }

    pub fn get(&self, type_name: &str) -> Option<&CatalogEntry> {
        self.entries.get(type_name)
    }

    /// Looks up a transform hook; stage factories do not count
    pub fn transform(&self, name: &str) -> Option<TransformHook> {
        match self.entries.get(name) {
            Some(CatalogEntry::Transform(hook)) => Some(*hook),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Locator -> namespace map consulted by the stage loader
#[derive(Debug, Clone, Default)]
pub struct StageCatalog {
    namespaces: BTreeMap<String, Namespace>,
}

impl StageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_stage(
        &mut self,
        locator: &str,
        type_name: &str,
        factory: StageFactory,
    ) -> &mut Self {
        self.namespace_mut(locator)
            .insert(type_name, CatalogEntry::Stage(factory));
        self
    }

    pub fn register_transform(
        &mut self,
        locator: &str,
        name: &str,
        hook: TransformHook,
    ) -> &mut Self {
        self.namespace_mut(locator)
            .insert(name, CatalogEntry::Transform(hook));
        self
    }

    /// Returns the namespace for `locator`, creating it if needed
    pub fn namespace_mut(&mut self, locator: &str) -> &mut Namespace {
        self.namespaces.entry(locator.to_string()).or_default()
    }

    pub fn namespace(&self, locator: &str) -> Option<&Namespace> {
        self.namespaces.get(locator)
    }

    pub fn locators(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Resolves `locator`/`type_name` to a stage factory
    pub fn resolve(
        &self,
        locator: &str,
        type_name: &str,
    ) -> Result<(StageFactory, &Namespace), LoadError> {
        let namespace = self
            .namespaces
            .get(locator)
            .ok_or_else(|| LoadError::LocatorNotFound(locator.to_string()))?;

        match namespace.get(type_name) {
            Some(CatalogEntry::Stage(factory)) => Ok((*factory, namespace)),
            Some(entry) => Err(LoadError::ContractViolation {
                locator: locator.to_string(),
                type_name: type_name.to_string(),
                found: entry.kind(),
            }),
            None => Err(LoadError::TypeNotFound {
                locator: locator.to_string(),
                type_name: type_name.to_string(),
            }),
        }
    }
}
