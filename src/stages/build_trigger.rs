use crate::pipeline::{option_or, Namespace, Payload, Stage, StageConfig, StageError};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Queues a build request for each record and reports it under `build`
///
/// The build system's protocol is not spoken here; the stage records what
/// would be sent. `data_received` is the size of the serialized input, 0 for
/// an empty record.
///
/// Options: `endpoint`, `build_type` (default `"default"`).
#[derive(Debug, Clone)]
pub struct BuildTrigger {
    config: StageConfig,
    endpoint: String,
    build_type: String,
}

impl BuildTrigger {
    pub fn new(config: StageConfig) -> Result<Self, StageError> {
        Ok(Self {
            endpoint: option_or(&config, "endpoint", String::new())?,
            build_type: option_or(&config, "build_type", "default".to_string())?,
            config,
        })
    }

    pub fn factory(config: StageConfig, _: &Namespace) -> Result<Box<dyn Stage>, StageError> {
        Ok(Box::new(Self::new(config)?))
    }

    pub fn build_type(&self) -> &str {
        &self.build_type
    }
}

impl Stage for BuildTrigger {
    fn name(&self) -> &str {
        "BuildTrigger"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn initialize(&mut self) -> bool {
        if self.endpoint.is_empty() {
            tracing::debug!("BuildTrigger has no endpoint configured");
        }
        true
    }

    fn execute(&mut self, payload: Payload) -> Result<Payload, StageError> {
        let data_received = match &payload {
            Payload::Record(record) if record.is_empty() => 0,
            Payload::Raw(value) if value.is_null() => 0,
            other => serde_json::to_string(other)?.len(),
        };

        let mut record = payload.into_record_wrapped();
        record.insert(
            "build".into(),
            json!({
                "status": "queued",
                "build_type": self.build_type,
                "endpoint": self.endpoint,
                "data_received": data_received,
                "requested_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            }),
        );
        Ok(Payload::Record(record))
    }

    fn cleanup(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn trigger(config: Value) -> BuildTrigger {
        BuildTrigger::new(config.as_object().cloned().unwrap()).unwrap()
    }

    #[test]
    fn test_queues_build() {
        let mut stage = trigger(json!({"endpoint": "https://build.test/hook", "build_type": "docs"}));
        let out = stage
            .execute(Payload::from_value(json!({"a": 1})))
            .unwrap()
            .into_value();

        assert_eq!(out["build"]["status"], "queued");
        assert_eq!(out["build"]["build_type"], "docs");
        assert_eq!(out["build"]["endpoint"], "https://build.test/hook");
        assert_eq!(out["build"]["data_received"], r#"{"a":1}"#.len());
        assert!(out["build"]["requested_at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(out["a"], 1);
    }

    #[test]
    fn test_empty_record_reports_zero() {
        let mut stage = trigger(json!({}));
        let out = stage.execute(Payload::from_value(json!({}))).unwrap().into_value();
        assert_eq!(out["build"]["data_received"], 0);
        assert_eq!(out["build"]["build_type"], "default");
    }
}
