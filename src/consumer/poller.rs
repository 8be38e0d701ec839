//! Per-shard polling loop
//!
//! A [`ShardPoller`] owns one shard's cursor for the lifetime of a single
//! `poll` call. It acquires an initial iterator, then fetches pages until the
//! worker's time budget runs out:
//!
//! - throttled fetches back off and retry with the same cursor
//! - successful fetches advance the cursor and feed the [`RecordSink`]
//! - any other error ends the poller and is reported in its [`PollResult`]

use super::sink::RecordSink;
use super::worker::ShardWorkerSpec;
use crate::client::KinesisClientTrait;
use crate::error::{FanoutError, Result};
use crate::retry::{Backoff, FixedBackoff};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Maximum number of records requested per GetRecords call
pub const DEFAULT_PAGE_LIMIT: i32 = 25;

/// Outcome of one shard worker
#[derive(Debug)]
pub struct PollResult {
    /// Worker name, e.g. `shard_worker:0`
    pub worker: String,
    /// Shard the worker was reading
    pub shard_id: String,
    /// Records read, or the error that ended the worker
    pub outcome: Result<u64>,
}

impl PollResult {
    pub fn record_count(&self) -> Option<u64> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Polls a single shard until its worker duration expires
pub struct ShardPoller<C, B = FixedBackoff>
where
    C: KinesisClientTrait,
    B: Backoff,
{
    client: Arc<C>,
    sink: Arc<dyn RecordSink>,
    backoff: B,
    page_limit: i32,
}

impl<C, B> ShardPoller<C, B>
where
    C: KinesisClientTrait,
    B: Backoff,
{
    pub fn new(client: Arc<C>, sink: Arc<dyn RecordSink>, backoff: B) -> Self {
        Self {
            client,
            sink,
            backoff,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, page_limit: i32) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Run the worker described by `spec` to completion
    pub async fn poll(&self, spec: &ShardWorkerSpec) -> PollResult {
        let outcome = self.poll_shard(spec).await;

        if let Err(e) = &outcome {
            error!(
                worker = %spec.name(),
                shard_id = %spec.shard_id(),
                error = %e,
                "Shard worker failed"
            );
        }

        PollResult {
            worker: spec.name().to_string(),
            shard_id: spec.shard_id().to_string(),
            outcome,
        }
    }

    async fn poll_shard(&self, spec: &ShardWorkerSpec) -> Result<u64> {
        info!(
            worker = %spec.name(),
            shard_id = %spec.shard_id(),
            iterator_type = %spec.iterator_position(),
            "Starting shard worker"
        );

        let mut cursor = self
            .client
            .get_shard_iterator(spec.stream_name(), spec.shard_id(), spec.iterator_position())
            .await
            .map_err(|source| FanoutError::GetIteratorFailed {
                shard_id: spec.shard_id().to_string(),
                source,
            })?;

        debug!(worker = %spec.name(), iterator = %cursor, "Acquired initial iterator");

        let deadline = Instant::now() + spec.worker_duration();
        let mut total: u64 = 0;
        let mut throttled_attempts: u32 = 0;

        while Instant::now() < deadline {
            match self.client.get_records(&cursor, self.page_limit).await {
                Ok((records, next_cursor)) => {
                    throttled_attempts = 0;
                    total += records.len() as u64;

                    if records.is_empty() {
                        trace!(worker = %spec.name(), "Empty page");
                    } else {
                        debug!(
                            worker = %spec.name(),
                            count = records.len(),
                            total = total,
                            "Fetched records"
                        );
                        self.sink.accept(spec.name(), &records);
                    }

                    match next_cursor {
                        Some(next) => cursor = next,
                        None => {
                            info!(
                                worker = %spec.name(),
                                shard_id = %spec.shard_id(),
                                "Shard closed, stopping worker early"
                            );
                            break;
                        }
                    }

                    tokio::time::sleep(spec.poll_interval()).await;
                }
                Err(e) if e.is_throttled() => {
                    throttled_attempts += 1;
                    let delay = self.backoff.next_delay(throttled_attempts);
                    warn!(
                        worker = %spec.name(),
                        attempt = throttled_attempts,
                        delay_ms = ?delay.as_millis(),
                        "Provisioned throughput exceeded, worker sleeping"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    return Err(FanoutError::GetRecordsFailed {
                        shard_id: spec.shard_id().to_string(),
                        source,
                    });
                }
            }
        }

        info!(worker = %spec.name(), records = total, "Shard worker finished");
        Ok(total)
    }
}
