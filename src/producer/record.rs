use super::partition::PartitionKeyResolver;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One application record: field names mapped to values, in insertion order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compact JSON object, fields in their original order
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.fields)?)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Wire form of a [`Record`]: serialized payload plus its routing key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEnvelope {
    pub data: Vec<u8>,
    pub partition_key: String,
}

impl RecordEnvelope {
    pub fn from_record(record: &Record, resolver: &PartitionKeyResolver) -> Result<Self> {
        Ok(Self {
            data: record.to_payload()?,
            partition_key: resolver.resolve(record),
        })
    }
}
