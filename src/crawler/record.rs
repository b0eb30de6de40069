use crate::crawler::fetcher::FetchResponse;
use crate::crawler::parser::ScrapedFields;
use crate::pipeline::{Payload, PipelineRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One successfully fetched page
///
/// Created once per successful fetch and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// URL as it sat in the frontier (normalized)
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status_code: u16,
    /// Response body
    pub content: String,
    pub headers: BTreeMap<String, String>,
    pub depth: u32,
    pub timestamp: DateTime<Utc>,
}

impl PageRecord {
    /// Builds a record from a fetch response, stamped with the current time
    pub fn from_response(url: &str, depth: u32, response: FetchResponse) -> Self {
        Self {
            url: url.to_string(),
            final_url: response.final_url,
            status_code: response.status_code,
            content: response.body,
            headers: response.headers,
            depth,
            timestamp: Utc::now(),
        }
    }

    /// Converts the page into a pipeline record
    ///
    /// The timestamp is rendered as RFC 3339 with second precision.
    pub fn to_record(&self) -> PipelineRecord {
        let mut record = PipelineRecord::new();
        record.insert("url".into(), Value::from(self.url.as_str()));
        record.insert("final_url".into(), Value::from(self.final_url.as_str()));
        record.insert("status_code".into(), Value::from(self.status_code));
        record.insert("content".into(), Value::from(self.content.as_str()));
        record.insert(
            "headers".into(),
            Value::Object(
                self.headers
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                    .collect(),
            ),
        );
        record.insert("depth".into(), Value::from(self.depth));
        record.insert(
            "timestamp".into(),
            Value::from(self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        record
    }

    /// Converts the page into a pipeline record with scraped fields under `scraped`
    ///
    /// The visible text is also copied to the top-level `text` key, where the
    /// classifier stage looks for it.
    pub fn with_scraped(&self, fields: &ScrapedFields) -> PipelineRecord {
        let mut record = self.to_record();
        record.insert("text".into(), Value::from(fields.text.as_str()));
        record.insert(
            "scraped".into(),
            serde_json::to_value(fields).unwrap_or(Value::Null),
        );
        record
    }

    pub fn into_payload(self) -> Payload {
        Payload::Record(self.to_record())
    }
}
