use crate::pipeline::{option_or, Namespace, Payload, Stage, StageConfig, StageError};
use serde_json::{json, Value};

/// Checks records against basic quality rules and reports under `validation`
///
/// Problems never fail the stage; they are reported as `errors` (record is
/// invalid) or `warnings`.
///
/// Options: `required_fields` (list), `min_content_length` (characters,
/// default 0), `allowed_status_codes` (default `[200]`).
#[derive(Debug, Clone)]
pub struct DataValidator {
    config: StageConfig,
    required_fields: Vec<String>,
    min_content_length: usize,
    allowed_status_codes: Vec<i64>,
}

impl DataValidator {
    pub fn new(config: StageConfig) -> Result<Self, StageError> {
        Ok(Self {
            required_fields: option_or(&config, "required_fields", Vec::new())?,
            min_content_length: option_or(&config, "min_content_length", 0)?,
            allowed_status_codes: option_or(&config, "allowed_status_codes", vec![200])?,
            config,
        })
    }

    pub fn factory(config: StageConfig, _: &Namespace) -> Result<Box<dyn Stage>, StageError> {
        Ok(Box::new(Self::new(config)?))
    }
}

impl Stage for DataValidator {
    fn name(&self) -> &str {
        "DataValidator"
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
            raw @ Payload::Raw(_) => {
                let mut record = raw.into_record_wrapped();
                record.insert(
                    "validation".into(),
                    json!({
                        "valid": false,
                        "errors": ["Data must be a mapping"],
                        "warnings": [],
                    }),
                );
                return Ok(Payload::Record(record));
            }
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for field in &self.required_fields {
            if !record.contains_key(field) {
                errors.push(format!("Missing required field: {}", field));
            }
        }

        if let Some(content) = record.get("content") {
            let length = match content {
                Value::String(s) => s.chars().count(),
                other => other.to_string().chars().count(),
            };
            if length < self.min_content_length {
                warnings.push(format!(
                    "Content length ({}) below minimum ({})",
                    length, self.min_content_length
                ));
            }
        }

        if let Some(status) = record.get("status_code") {
            let allowed = status
                .as_i64()
                .is_some_and(|code| self.allowed_status_codes.contains(&code));
            if !allowed {
                errors.push(format!("Invalid status code: {}", status));
            }
        }

        record.insert(
            "validation".into(),
            json!({
                "valid": errors.is_empty(),
                "errors": errors,
                "warnings": warnings,
            }),
        );
        Ok(Payload::Record(record))
    }

    fn cleanup(&mut self) {}
}
