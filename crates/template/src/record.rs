use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flat mapping of field names to values, substituted into a template.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}
impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Everything a single data argument can hold.
///
/// A [`Batch`](Self::Batch) may only ever be sent to a printer; file and
/// standard output support exactly one record.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Single(Record),
    Batch(Vec<Record>),
}
impl Payload {
    pub(crate) fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(records) => records.len(),
        }
    }
}
