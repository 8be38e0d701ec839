//! Test utilities and mock implementations for the consumer and producer

pub mod mocks;

use crate::producer::Record as ProducerRecord;
use aws_sdk_kinesis::types::{Record, Shard};
use aws_smithy_types::Blob;

/// Helper functions for creating test data
pub struct TestUtils;

impl TestUtils {
    /// Create a stream record with given sequence number and data
    pub fn create_test_record(sequence_number: &str, data: &[u8]) -> Record {
        Record::builder()
            .sequence_number(sequence_number)
            .data(Blob::new(data.to_vec()))
            .partition_key("test-partition-key")
            .build()
            .expect("Failed to build test record")
    }

    pub fn create_test_shard(shard_id: &str) -> Shard {
        Shard::builder()
            .shard_id(shard_id)
            .build()
            .expect("Failed to build test shard")
    }

    pub fn create_test_records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Self::create_test_record(
                    &format!("sequence-{}", i),
                    format!("data-{}", i).as_bytes(),
                )
            })
            .collect()
    }

    pub fn create_test_shards(shard_ids: &[&str]) -> Vec<Shard> {
        shard_ids
            .iter()
            .map(|id| Self::create_test_shard(id))
            .collect()
    }

    /// Producer records with an `id` field of `id-<n>` and a `name` field
    pub fn create_producer_records(count: usize) -> Vec<ProducerRecord> {
        (0..count)
            .map(|i| {
                ProducerRecord::from_fields([
                    ("id", format!("id-{}", i)),
                    ("name", format!("name-{}", i)),
                ])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_create_test_record() {
        let record = TestUtils::create_test_record("seq-1", b"test-data");
        assert_eq!(record.sequence_number(), "seq-1");
        assert_eq!(record.data().as_ref(), b"test-data");
        assert_eq!(record.partition_key(), "test-partition-key");
    }

    #[test]
    fn test_create_test_records() {
        let records = TestUtils::create_test_records(3);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].sequence_number(), "sequence-0");
        assert_eq!(records[2].sequence_number(), "sequence-2");
    }

    #[test]
    fn test_create_test_shards() {
        let shards = TestUtils::create_test_shards(&["shard-a", "shard-b"]);
        let ids: Vec<&str> = shards.iter().map(|s| s.shard_id()).collect();
        assert_eq!(ids, vec!["shard-a", "shard-b"]);
    }

    #[test]
    fn test_create_producer_records() {
        let records = TestUtils::create_producer_records(2);
        assert_eq!(records[1].get("id"), Some(&Value::String("id-1".to_string())));
        assert_eq!(records[1].len(), 2);
    }
}
