//! Runtime configuration for the consumer and producer

use crate::consumer::{IteratorPosition, DEFAULT_MAX_CONCURRENCY, DEFAULT_PAGE_LIMIT};
use crate::error::{FanoutError, Result};
use crate::producer::{ThrottlePolicy, MAX_BATCH_SIZE};
use crate::retry::DEFAULT_THROTTLE_BACKOFF;
use std::time::Duration;

/// Configuration for a consumer run
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Name of the Kinesis stream to read
    pub stream_name: String,
    /// How long each shard worker keeps polling
    pub worker_duration: Duration,
    /// Sleep between successful fetches
    pub poll_interval: Duration,
    /// Maximum records requested per GetRecords call
    pub page_limit: i32,
    /// Maximum number of shard workers running at once
    pub max_concurrency: usize,
    /// Where every worker starts reading
    pub iterator_position: IteratorPosition,
    /// Sleep after a throttled fetch
    pub throttle_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            stream_name: String::new(),
            worker_duration: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            page_limit: DEFAULT_PAGE_LIMIT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            iterator_position: IteratorPosition::TrimHorizon,
            throttle_backoff: DEFAULT_THROTTLE_BACKOFF,
        }
    }
}

impl ConsumerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stream_name.is_empty() {
            return Err(FanoutError::ConfigError("stream_name is required".to_string()));
        }
        // GetRecords accepts 1..=10000
        if !(1..=10_000).contains(&self.page_limit) {
            return Err(FanoutError::ConfigError(format!(
                "page_limit must be between 1 and 10000, got {}",
                self.page_limit
            )));
        }
        if self.max_concurrency == 0 {
            return Err(FanoutError::ConfigError(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a producer run
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Name of the Kinesis stream to write
    pub stream_name: String,
    /// Records per PutRecords call
    pub batch_size: usize,
    /// Cap on records read from the source; `None` reads everything
    pub max_records: Option<usize>,
    /// Sleep after each full batch
    pub sleep_interval: Duration,
    /// Record field used as partition key; random keys when unset
    pub partition_key: Option<String>,
    /// Sleep after a throttled put
    pub throttle_backoff: Duration,
    /// What to do with a batch the service throttled
    pub throttle_policy: ThrottlePolicy,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            stream_name: String::new(),
            batch_size: 10,
            max_records: Some(10),
            sleep_interval: Duration::from_millis(200),
            partition_key: None,
            throttle_backoff: DEFAULT_THROTTLE_BACKOFF,
            throttle_policy: ThrottlePolicy::Drop,
        }
    }
}

impl ProducerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stream_name.is_empty() {
            return Err(FanoutError::ConfigError("stream_name is required".to_string()));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(FanoutError::ConfigError(format!(
                "batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        if let ThrottlePolicy::Retry { max_attempts: 0 } = self.throttle_policy {
            return Err(FanoutError::ConfigError(
                "throttle retry needs at least one attempt".to_string(),
            ));
        }
        Ok(())
    }
}
