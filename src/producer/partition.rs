use super::record::Record;
use serde_json::Value;

/// Chooses the partition key that routes a record to a shard
///
/// With a key field configured and present on the record, every record that
/// shares the field's value lands on the same shard, which keeps their
/// relative write order. Otherwise each record gets a fresh random key and
/// writes spread evenly across shards with no ordering at all.
#[derive(Debug, Clone, Default)]
pub struct PartitionKeyResolver {
    key_field: Option<String>,
}

impl PartitionKeyResolver {
    pub fn new(key_field: Option<String>) -> Self {
        Self { key_field }
    }

    pub fn key_field(&self) -> Option<&str> {
        self.key_field.as_deref()
    }

    pub fn resolve(&self, record: &Record) -> String {
        self.key_field
            .as_deref()
            .and_then(|field| record.get(field))
            .and_then(value_as_key)
            .unwrap_or_else(random_partition_key)
    }
}

// Kinesis rejects empty partition keys, so a blank value counts as absent
fn value_as_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A random 128-bit key rendered as 32 hex digits
pub fn random_partition_key() -> String {
    format!("{:032x}", rand::random::<u128>())
}
