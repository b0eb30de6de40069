use crate::pipeline::{option_or, Namespace, Payload, PipelineRecord, Stage, StageConfig, StageError};
use serde_json::{json, Value};

const DEFAULT_KEYWORDS: &[&str] = &["web", "data", "content", "page", "article"];

/// Tags records with categories and keyword tags under `taxonomy`
///
/// Tags are the configured keywords found in the record's `text` (or
/// `scraped.text`), matched case-insensitively. Raw payloads are wrapped as
/// `{"raw": value}` and classified with no tags.
///
/// Options: `default_categories`, `keywords`, `confidence` (default 0.85),
/// `auto_classify` (default true; when false no tags are extracted).
#[derive(Debug, Clone)]
pub struct TaxonomyClassifier {
    config: StageConfig,
    categories: Vec<String>,
    keywords: Vec<String>,
    confidence: f64,
    auto_classify: bool,
}

impl TaxonomyClassifier {
    pub fn new(config: StageConfig) -> Result<Self, StageError> {
        let default_keywords = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
        let keywords: Vec<String> = option_or(&config, "keywords", default_keywords)?;

        Ok(Self {
            categories: option_or(&config, "default_categories", Vec::new())?,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            confidence: option_or(&config, "confidence", 0.85)?,
            auto_classify: option_or(&config, "auto_classify", true)?,
            config,
        })
    }

    pub fn factory(config: StageConfig, _: &Namespace) -> Result<Box<dyn Stage>, StageError> {
        Ok(Box::new(Self::new(config)?))
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Appends `category` to a record's `taxonomy.categories`
    pub fn add_category(record: &mut PipelineRecord, category: &str) {
        let taxonomy = record
            .entry("taxonomy")
            .or_insert_with(|| json!({ "categories": [] }));
        if !taxonomy.is_object() {
            *taxonomy = json!({ "categories": [] });
        }
        let categories = &mut taxonomy["categories"];
        match categories {
            Value::Array(items) => items.push(Value::from(category)),
            other => *other = json!([category]),
        }
    }

    fn extract_tags(&self, record: &PipelineRecord) -> Vec<String> {
        let text = record
            .get("text")
            .or_else(|| record.get("scraped").and_then(|s| s.get("text")));
        let Some(text) = text else {
            return Vec::new();
        };

        let text = match text {
            Value::String(s) => s.to_lowercase(),
            other => other.to_string().to_lowercase(),
        };

        self.keywords
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .cloned()
            .collect()
    }
}

impl Stage for TaxonomyClassifier {
    fn name(&self) -> &str {
        "TaxonomyClassifier"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn initialize(&mut self) -> bool {
        true
    }

    fn execute(&mut self, payload: Payload) -> Result<Payload, StageError> {
        let mut record = payload.into_record_wrapped();
        let tags = if self.auto_classify {
            self.extract_tags(&record)
        } else {
            Vec::new()
        };

        record.insert(
            "taxonomy".into(),
            json!({
                "categories": self.categories,
                "tags": tags,
                "confidence": self.confidence,
            }),
        );
        Ok(Payload::Record(record))
    }

    fn cleanup(&mut self) {}
}
