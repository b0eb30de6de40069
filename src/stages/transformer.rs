use crate::pipeline::{
    option_or, Namespace, Payload, PipelineRecord, Stage, StageConfig, StageError, TransformHook,
};
use serde_json::Value;

/// Built-in whole-record rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    /// Lowercase top-level keys
    LowercaseKeys,
    /// Drop top-level keys whose value is null
    RemoveNulls,
    /// Collapse nested objects into dotted keys (`a.b.c`)
    Flatten,
}

impl Transformation {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "lowercase_keys" => Some(Self::LowercaseKeys),
            "remove_nulls" => Some(Self::RemoveNulls),
            "flatten" => Some(Self::Flatten),
            _ => None,
        }
    }

    pub fn apply(self, record: PipelineRecord) -> PipelineRecord {
        match self {
            Self::LowercaseKeys => record
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
            Self::RemoveNulls => record.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            Self::Flatten => {
                let mut out = PipelineRecord::new();
                flatten_into(&mut out, "", record);
                out
            }
        }
    }
}

fn flatten_into(out: &mut PipelineRecord, prefix: &str, record: PipelineRecord) {
    for (key, value) in record {
        let key = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) => flatten_into(out, &key, nested),
            other => {
                out.insert(key, other);
            }
        }
    }
}

/// Rewrites the shape of records
///
/// This stage owns the whole record: built-in transformations from the
/// `transformations` option run first, in order, then the hooks named in
/// `hooks` (resolved in the catalog namespace the stage was loaded from),
/// then hooks added with [`DataTransformer::register_transformer`]. Raw
/// payloads pass through untouched.
pub struct DataTransformer {
    config: StageConfig,
    transformations: Vec<Transformation>,
    hooks: Vec<(String, TransformHook)>,
}

impl DataTransformer {
    /// Builds a transformer without catalog hooks
    pub fn new(config: StageConfig) -> Result<Self, StageError> {
        let names: Vec<String> = option_or(&config, "transformations", Vec::new())?;
        let transformations = names
            .iter()
            .map(|name| {
                Transformation::parse(name)
                    .ok_or_else(|| StageError::Config(format!("unknown transformation: {}", name)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            transformations,
            hooks: Vec::new(),
        })
    }

    pub fn factory(config: StageConfig, namespace: &Namespace) -> Result<Box<dyn Stage>, StageError> {
        let hook_names: Vec<String> = option_or(&config, "hooks", Vec::new())?;
        let mut stage = Self::new(config)?;
        for name in hook_names {
            let hook = namespace
                .transform(&name)
                .ok_or_else(|| StageError::Config(format!("unknown transform hook: {}", name)))?;
            stage.register_transformer(name, hook);
        }
        Ok(Box::new(stage))
    }

    /// Adds a hook run after the built-in transformations
    ///
    /// A hook registered again under the same name keeps its position.
    pub fn register_transformer(&mut self, name: impl Into<String>, hook: TransformHook) {
        let name = name.into();
        match self.hooks.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = hook,
            None => self.hooks.push((name, hook)),
        }
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Stage for DataTransformer {
    fn name(&self) -> &str {
        "DataTransformer"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn initialize(&mut self) -> bool {
        true
    }

    fn execute(&mut self, payload: Payload) -> Result<Payload, StageError> {
        let mut record = match payload {
            Payload::Record(record) => record,
            raw => return Ok(raw),
        };

        for transformation in &self.transformations {
            record = transformation.apply(record);
        }
        for (_, hook) in &self.hooks {
            record = hook(record);
        }

        Ok(Payload::Record(record))
    }

    fn cleanup(&mut self) {}
}

/// Catalog hook: drops the raw page body
pub fn drop_content(mut record: PipelineRecord) -> PipelineRecord {
    record.remove("content");
    record
}

/// Catalog hook: trims surrounding whitespace from top-level strings
pub fn trim_strings(record: PipelineRecord) -> PipelineRecord {
    record
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, Value::String(s.trim().to_string())),
            other => (k, other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{CatalogEntry, StageCatalog};
    use serde_json::json;

    fn config(value: Value) -> StageConfig {
        value.as_object().cloned().unwrap()
    }

    fn run(stage: &mut DataTransformer, input: Value) -> Value {
        stage.execute(Payload::from_value(input)).unwrap().into_value()
    }

    #[test]
    fn test_lowercase_and_remove_nulls() {
        let mut stage =
            DataTransformer::new(config(json!({"transformations": ["lowercase_keys", "remove_nulls"]})))
                .unwrap();
        let out = run(&mut stage, json!({"Title": "T", "Empty": null}));
        assert_eq!(out, json!({"title": "T"}));
    }

    #[test]
    fn test_flatten() {
        let mut stage = DataTransformer::new(config(json!({"transformations": ["flatten"]}))).unwrap();
        let out = run(&mut stage, json!({"a": {"b": {"c": 1}, "d": [1]}, "e": 2}));
        assert_eq!(out, json!({"a.b.c": 1, "a.d": [1], "e": 2}));
    }

    #[test]
    fn test_raw_passes_through() {
        let mut stage = DataTransformer::new(config(json!({"transformations": ["flatten"]}))).unwrap();
        assert_eq!(run(&mut stage, json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_unknown_transformation_rejected() {
        let result = DataTransformer::new(config(json!({"transformations": ["shout"]})));
        assert!(matches!(result, Err(StageError::Config(_))));
    }

    #[test]
    fn test_registered_hooks_run_after_builtins() {
        let mut stage =
            DataTransformer::new(config(json!({"transformations": ["lowercase_keys"]}))).unwrap();
        stage.register_transformer("trim", trim_strings);
        stage.register_transformer("drop", drop_content);

        let out = run(&mut stage, json!({"Content": "body", "content": "x", "Name": "  n  "}));
        assert_eq!(out, json!({"name": "n"}));
        assert_eq!(stage.hook_names(), vec!["trim", "drop"]);
    }

    #[test]
    fn test_factory_resolves_hooks() {
        let mut catalog = StageCatalog::new();
        catalog.register_transform("builtin", "trim_strings", trim_strings);
        let namespace = catalog.namespace("builtin").unwrap();

        let mut stage =
            DataTransformer::factory(config(json!({"hooks": ["trim_strings"]})), namespace).unwrap();
        let out = stage
            .execute(Payload::from_value(json!({"a": " x "})))
            .unwrap()
            .into_value();
        assert_eq!(out, json!({"a": "x"}));

        let missing = DataTransformer::factory(config(json!({"hooks": ["nope"]})), namespace);
        assert!(missing.is_err());
        assert!(matches!(namespace.get("trim_strings"), Some(CatalogEntry::Transform(_))));
    }
}
