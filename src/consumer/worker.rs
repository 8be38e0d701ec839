use crate::config::ConsumerConfig;
use aws_sdk_kinesis::types::ShardIteratorType;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Specifies where a shard worker starts reading
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IteratorPosition {
    /// Start from the oldest available record
    #[default]
    TrimHorizon,
    /// Start from the newest record
    Latest,
    /// Start at a specific sequence number
    AtSequenceNumber(String),
    /// Start right after a specific sequence number
    AfterSequenceNumber(String),
    /// Start from a specific timestamp
    AtTimestamp(DateTime<Utc>),
}

impl IteratorPosition {
    pub fn iterator_type(&self) -> ShardIteratorType {
        match self {
            IteratorPosition::TrimHorizon => ShardIteratorType::TrimHorizon,
            IteratorPosition::Latest => ShardIteratorType::Latest,
            IteratorPosition::AtSequenceNumber(_) => ShardIteratorType::AtSequenceNumber,
            IteratorPosition::AfterSequenceNumber(_) => ShardIteratorType::AfterSequenceNumber,
            IteratorPosition::AtTimestamp(_) => ShardIteratorType::AtTimestamp,
        }
    }
}

impl fmt::Display for IteratorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.iterator_type().as_str())
    }
}

/// Immutable description of the work assigned to one shard
#[derive(Debug, Clone)]
pub struct ShardWorkerSpec {
    stream_name: String,
    shard_id: String,
    iterator_position: IteratorPosition,
    worker_duration: Duration,
    poll_interval: Duration,
    name: String,
}

impl ShardWorkerSpec {
    /// Build the spec for the shard at `index` in the stream's shard listing
    pub fn for_shard(config: &ConsumerConfig, shard_id: impl Into<String>, index: usize) -> Self {
        Self {
            stream_name: config.stream_name.clone(),
            shard_id: shard_id.into(),
            iterator_position: config.iterator_position.clone(),
            worker_duration: config.worker_duration,
            poll_interval: config.poll_interval,
            name: format!("shard_worker:{}", index),
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn shard_id(&self) -> &str {
        &self.shard_id
    }

    pub fn iterator_position(&self) -> &IteratorPosition {
        &self.iterator_position
    }

    pub fn worker_duration(&self) -> Duration {
        self.worker_duration
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
