use super::partition::PartitionKeyResolver;
use super::record::{Record, RecordEnvelope};
use crate::client::{KinesisClientError, KinesisClientTrait, PutRecordsResult};
use crate::error::{FanoutError, Result};
use crate::retry::{Backoff, FixedBackoff, RetryError, RetryHandle};
use std::sync::Arc;
use tracing::{debug, warn};

/// Largest batch a single PutRecords call accepts
pub const MAX_BATCH_SIZE: usize = 500;

/// What the producer does with a batch the service throttled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThrottlePolicy {
    /// Back off once and count the whole batch as dropped
    #[default]
    Drop,
    /// Back off and resubmit the same batch, dropping it only once
    /// `max_attempts` submissions were all throttled
    Retry { max_attempts: u32 },
}

impl ThrottlePolicy {
    fn max_attempts(&self) -> u32 {
        match self {
            ThrottlePolicy::Drop => 1,
            ThrottlePolicy::Retry { max_attempts } => *max_attempts,
        }
    }
}

/// Accounting for one submitted batch
///
/// `success_count + error_count + dropped_count` always equals the batch
/// length; a batch the service answered never has dropped entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub error_count: usize,
    pub dropped_count: usize,
}

impl BatchOutcome {
    fn answered(result: PutRecordsResult) -> Self {
        Self {
            success_count: result.accepted_count,
            error_count: result.failed_count,
            dropped_count: 0,
        }
    }

    fn dropped(len: usize) -> Self {
        Self {
            success_count: 0,
            error_count: 0,
            dropped_count: len,
        }
    }

    /// Number of records this batch carried
    pub fn len(&self) -> usize {
        self.success_count + self.error_count + self.dropped_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn was_dropped(&self) -> bool {
        self.dropped_count > 0
    }
}

/// Serializes records, assigns partition keys and submits them as one batch
pub struct BatchProducer<C, B = FixedBackoff>
where
    C: KinesisClientTrait,
    B: Backoff + Clone,
{
    client: Arc<C>,
    stream_name: String,
    resolver: PartitionKeyResolver,
    backoff: B,
    throttle_policy: ThrottlePolicy,
}

impl<C, B> BatchProducer<C, B>
where
    C: KinesisClientTrait,
    B: Backoff + Clone,
{
    pub fn new(
        client: Arc<C>,
        stream_name: impl Into<String>,
        resolver: PartitionKeyResolver,
        backoff: B,
    ) -> Self {
        Self {
            client,
            stream_name: stream_name.into(),
            resolver,
            backoff,
            throttle_policy: ThrottlePolicy::Drop,
        }
    }

    pub fn with_throttle_policy(mut self, throttle_policy: ThrottlePolicy) -> Self {
        self.throttle_policy = throttle_policy;
        self
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Submit `records` as a single PutRecords call
    ///
    /// Partial failures inside an answered call are counted in
    /// `error_count`. Throttling is handled according to the
    /// [`ThrottlePolicy`]; every other service error is returned.
    pub async fn put_batch(&self, records: &[Record]) -> Result<BatchOutcome> {
        if records.is_empty() || records.len() > MAX_BATCH_SIZE {
            return Err(FanoutError::InvalidBatchSize(records.len()));
        }

        let envelopes = records
            .iter()
            .map(|record| RecordEnvelope::from_record(record, &self.resolver))
            .collect::<Result<Vec<_>>>()?;

        let client = &self.client;
        let stream_name = self.stream_name.as_str();
        let batch = envelopes.as_slice();

        let mut retry = RetryHandle::new(self.throttle_policy.max_attempts(), self.backoff.clone());
        let submitted = retry
            .retry(
                move || client.put_records(stream_name, batch),
                KinesisClientError::is_throttled,
            )
            .await;

        match submitted {
            Ok(result) => {
                let outcome = BatchOutcome::answered(result);
                if outcome.error_count > 0 {
                    warn!(
                        stream = %self.stream_name,
                        batch_size = batch.len(),
                        failed = outcome.error_count,
                        "Some records in the batch were rejected"
                    );
                } else {
                    debug!(
                        stream = %self.stream_name,
                        batch_size = batch.len(),
                        "Batch accepted"
                    );
                }
                Ok(outcome)
            }
            Err(RetryError::Exhausted { attempts, last_error }) => {
                warn!(
                    stream = %self.stream_name,
                    batch_size = batch.len(),
                    attempts = attempts,
                    error = %last_error,
                    "Provisioned throughput exceeded, dropping batch"
                );
                Ok(BatchOutcome::dropped(batch.len()))
            }
            Err(RetryError::Fatal(source)) => Err(FanoutError::PutRecordsFailed {
                stream: self.stream_name.clone(),
                source,
            }),
        }
    }
}
