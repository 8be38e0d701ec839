//! Fan-out consumer: one polling worker per shard, bounded concurrency
//!
//! [`KinesisConsumer`] lists the stream's shards once, builds a
//! [`ShardWorkerSpec`] for each, and hands them to a [`ShardWorkerPool`].
//! Shards created after the listing are not picked up.

mod poller;
mod pool;
mod sink;
mod worker;

pub use poller::{PollResult, ShardPoller, DEFAULT_PAGE_LIMIT};
pub use pool::{PoolSummary, ShardWorkerPool, DEFAULT_MAX_CONCURRENCY};
pub use sink::{DiscardSink, EchoSink, RecordSink};
pub use worker::{IteratorPosition, ShardWorkerSpec};

use crate::client::KinesisClientTrait;
use crate::config::ConsumerConfig;
use crate::error::{FanoutError, Result};
use crate::retry::FixedBackoff;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Totals reported at the end of a consumer run
#[derive(Debug)]
pub struct ConsumerSummary {
    pub shard_count: usize,
    pub total_records: u64,
    pub elapsed: Duration,
    pub poll_interval: Duration,
    pub outcomes: Vec<PollResult>,
}

impl ConsumerSummary {
    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_records as f64 / secs
        } else {
            0.0
        }
    }

    pub fn failed_workers(&self) -> usize {
        self.outcomes.iter().filter(|r| !r.is_success()).count()
    }
}

impl fmt::Display for ConsumerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-=> Exiting Worker Main <=-")?;
        writeln!(f, "  Total Records: {}", self.total_records)?;
        writeln!(f, "     Shards: {} ({} failed)", self.shard_count, self.failed_workers())?;
        writeln!(f, "     Total Time (s): {:.2}", self.elapsed.as_secs_f64())?;
        writeln!(f, "  Records / sec: {:.2}", self.records_per_second())?;
        write!(f, "  Worker sleep interval: {:?}", self.poll_interval)
    }
}

/// Reads every shard of a stream for a fixed duration
pub struct KinesisConsumer<C>
where
    C: KinesisClientTrait + 'static,
{
    client: Arc<C>,
    config: ConsumerConfig,
    sink: Arc<dyn RecordSink>,
}

impl<C> KinesisConsumer<C>
where
    C: KinesisClientTrait + 'static,
{
    pub fn new(config: ConsumerConfig, client: C, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            client: Arc::new(client),
            config,
            sink,
        }
    }

    /// Discover shards and run a worker on each until their durations expire
    ///
    /// Failing to list shards aborts the run; a failing worker only removes
    /// its own shard from the totals.
    pub async fn run(&self) -> Result<ConsumerSummary> {
        self.config.validate()?;
        let start = Instant::now();
        let stream = &self.config.stream_name;

        info!(stream = %stream, "Starting Kinesis consumer");

        let shards = self
            .client
            .list_shards(stream)
            .await
            .map_err(|source| FanoutError::ListShardsFailed {
                stream: stream.clone(),
                source,
            })?;

        info!(stream = %stream, shard_count = shards.len(), "Discovered shards");

        let specs: Vec<ShardWorkerSpec> = shards
            .iter()
            .enumerate()
            .map(|(index, shard)| {
                debug!(shard_id = %shard.shard_id(), index = index, "Preparing shard worker");
                ShardWorkerSpec::for_shard(&self.config, shard.shard_id(), index)
            })
            .collect();

        let poller = ShardPoller::new(
            self.client.clone(),
            self.sink.clone(),
            FixedBackoff::new(self.config.throttle_backoff),
        )
        .with_page_limit(self.config.page_limit);

        let summary = ShardWorkerPool::new(poller)
            .run(specs, self.config.max_concurrency)
            .await?;

        Ok(ConsumerSummary {
            shard_count: shards.len(),
            total_records: summary.total_records,
            elapsed: start.elapsed(),
            poll_interval: self.config.poll_interval,
            outcomes: summary.outcomes,
        })
    }
}
