use crate::pipeline::{option_or, Namespace, Payload, PipelineRecord, Stage, StageConfig, StageError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// One routing rule: every condition must equal the record's value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Falls back to the rule name when absent
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub conditions: Map<String, Value>,
}

impl RouteRule {
    pub fn matches(&self, record: &PipelineRecord) -> bool {
        self.conditions
            .iter()
            .all(|(key, expected)| record.get(key) == Some(expected))
    }
}

/// Picks destinations for records and reports them under `gateway`
///
/// Rules are checked in name order; a record matching none goes to
/// `"default"`. Raw payloads are wrapped as `{"raw": value}` and always take
/// the default route.
///
/// Options: `routing_rules` (table of rules), `retry_enabled` (default true),
/// `max_retries` (default 3).
#[derive(Debug, Clone)]
pub struct GatewayRouter {
    config: StageConfig,
    rules: BTreeMap<String, RouteRule>,
    retry_enabled: bool,
    max_retries: u32,
}

impl GatewayRouter {
    pub fn new(config: StageConfig) -> Result<Self, StageError> {
        Ok(Self {
            rules: option_or(&config, "routing_rules", BTreeMap::new())?,
            retry_enabled: option_or(&config, "retry_enabled", true)?,
            max_retries: option_or(&config, "max_retries", 3)?,
            config,
        })
    }

    pub fn factory(config: StageConfig, _: &Namespace) -> Result<Box<dyn Stage>, StageError> {
        Ok(Box::new(Self::new(config)?))
    }

    /// Adds or replaces the rule called `name`
    pub fn add_route(
        &mut self,
        name: impl Into<String>,
        destination: impl Into<String>,
        conditions: Map<String, Value>,
    ) {
        self.rules.insert(
            name.into(),
            RouteRule {
                destination: Some(destination.into()),
                conditions,
            },
        );
    }

    /// Destinations for `record`
    pub fn routes(&self, record: &PipelineRecord) -> Vec<String> {
        let routes: Vec<String> = self
            .rules
            .iter()
            .filter(|(_, rule)| rule.matches(record))
            .map(|(name, rule)| rule.destination.clone().unwrap_or_else(|| name.clone()))
            .collect();

        if routes.is_empty() {
            vec!["default".to_string()]
        } else {
            routes
        }
    }
}

impl Stage for GatewayRouter {
    fn name(&self) -> &str {
        "GatewayRouter"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn initialize(&mut self) -> bool {
        true
    }

    fn execute(&mut self, payload: Payload) -> Result<Payload, StageError> {
        let routes = match &payload {
            Payload::Record(record) => self.routes(record),
            Payload::Raw(_) => vec!["default".to_string()],
        };

        let mut record = payload.into_record_wrapped();
        record.insert(
            "gateway".into(),
            json!({
                "status": "routed",
                "routes": routes,
                "retry_enabled": self.retry_enabled,
                "max_retries": self.max_retries,
            }),
        );
        Ok(Payload::Record(record))
    }

    fn cleanup(&mut self) {}
}
