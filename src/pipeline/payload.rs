use serde::Serialize;
use serde_json::{Map, Value};

/// Open key/value record threaded through the stages
pub type PipelineRecord = Map<String, Value>;

/// What a stage receives and returns
///
/// Most stages work on records. Anything else travels as [`Payload::Raw`];
/// a stage that needs a record either wraps the raw value with
/// [`Payload::into_record_wrapped`] or fails with an explicit error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Record(PipelineRecord),
    Raw(Value),
}

impl Payload {
    /// Classifies a JSON value: objects become records, the rest stays raw
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Record(map),
            other => Self::Raw(other),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Record(map) => Value::Object(map),
            Self::Raw(value) => value,
        }
    }

    pub fn as_record(&self) -> Option<&PipelineRecord> {
        match self {
            Self::Record(map) => Some(map),
            Self::Raw(_) => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Returns the record, or `{"raw": value}` for a raw payload
    pub fn into_record_wrapped(self) -> PipelineRecord {
        match self {
            Self::Record(map) => map,
            Self::Raw(value) => {
                let mut map = PipelineRecord::new();
                map.insert("raw".into(), value);
                map
            }
        }
    }
}

impl From<PipelineRecord> for Payload {
    fn from(record: PipelineRecord) -> Self {
        Self::Record(record)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
