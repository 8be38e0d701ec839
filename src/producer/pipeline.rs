use super::batch::{BatchOutcome, BatchProducer};
use super::partition::PartitionKeyResolver;
use super::record::Record;
use crate::client::KinesisClientTrait;
use crate::config::ProducerConfig;
use crate::error::{FanoutError, Result};
use crate::retry::{Backoff, FixedBackoff};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Running totals for a producer run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProducerSummary {
    pub total_records: usize,
    pub total_successes: usize,
    pub total_errors: usize,
    pub total_dropped: usize,
    pub batches: Vec<BatchOutcome>,
    pub elapsed: Duration,
    pub sleep_interval: Duration,
}

impl ProducerSummary {
    fn add_batch(&mut self, outcome: BatchOutcome) {
        self.total_successes += outcome.success_count;
        self.total_errors += outcome.error_count;
        self.total_dropped += outcome.dropped_count;
        self.batches.push(outcome);
    }

    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_records as f64 / secs
        } else {
            0.0
        }
    }

    /// Rejected records as a percentage of records read
    pub fn failure_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.total_errors as f64 / self.total_records as f64 * 100.0
        }
    }
}

impl fmt::Display for ProducerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-=> Exiting Producer Main <=-")?;
        writeln!(f, "  Total Records: {}", self.total_records)?;
        writeln!(f, "     Total Successes: {}", self.total_successes)?;
        writeln!(f, "     Total Errors   : {}", self.total_errors)?;
        writeln!(f, "     Total Dropped  : {}", self.total_dropped)?;
        writeln!(f, "     Total Time (s) : {:.2}", self.elapsed.as_secs_f64())?;
        writeln!(f, "  Records / sec: {:.2}", self.records_per_second())?;
        writeln!(f, "  Failure rate: {:.2}%", self.failure_rate())?;
        write!(f, "  Worker sleep interval: {:?}", self.sleep_interval)
    }
}

/// Groups a record source into batches and submits them one at a time
pub struct ProducerPipeline<C, B = FixedBackoff>
where
    C: KinesisClientTrait,
    B: Backoff + Clone,
{
    producer: BatchProducer<C, B>,
    batch_size: usize,
    max_records: Option<usize>,
    sleep_interval: Duration,
}

impl<C> ProducerPipeline<C>
where
    C: KinesisClientTrait,
{
    pub fn from_config(client: Arc<C>, config: &ProducerConfig) -> Result<Self> {
        config.validate()?;

        let producer = BatchProducer::new(
            client,
            config.stream_name.clone(),
            PartitionKeyResolver::new(config.partition_key.clone()),
            FixedBackoff::new(config.throttle_backoff),
        )
        .with_throttle_policy(config.throttle_policy);

        Self::new(producer, config.batch_size, config.max_records, config.sleep_interval)
    }
}

impl<C, B> ProducerPipeline<C, B>
where
    C: KinesisClientTrait,
    B: Backoff + Clone,
{
    pub fn new(
        producer: BatchProducer<C, B>,
        batch_size: usize,
        max_records: Option<usize>,
        sleep_interval: Duration,
    ) -> Result<Self> {
        if !(1..=super::MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(FanoutError::ConfigError(format!(
                "batch_size must be between 1 and {}, got {}",
                super::MAX_BATCH_SIZE,
                batch_size
            )));
        }

        Ok(Self {
            producer,
            batch_size,
            max_records,
            sleep_interval,
        })
    }

    /// Read up to `max_records` records and submit them in order
    ///
    /// Full batches are followed by `sleep_interval`; the trailing partial
    /// batch is flushed without a sleep. A source error or a fatal put
    /// error ends the run.
    pub async fn run<I>(&self, records: I) -> Result<ProducerSummary>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let start = Instant::now();
        let mut summary = ProducerSummary {
            sleep_interval: self.sleep_interval,
            ..Default::default()
        };
        let mut pending = Vec::with_capacity(self.batch_size);
        let limit = self.max_records.unwrap_or(usize::MAX);

        info!(
            stream = %self.producer.stream_name(),
            batch_size = self.batch_size,
            max_records = ?self.max_records,
            "Starting producer"
        );

        for record in records.into_iter().take(limit) {
            pending.push(record?);
            summary.total_records += 1;

            if pending.len() == self.batch_size {
                let outcome = self.producer.put_batch(&pending).await?;
                debug!(batch = summary.batches.len(), outcome = ?outcome, "Batch submitted");
                summary.add_batch(outcome);
                pending.clear();

                tokio::time::sleep(self.sleep_interval).await;
            }
        }

        if !pending.is_empty() {
            let outcome = self.producer.put_batch(&pending).await?;
            debug!(batch = summary.batches.len(), outcome = ?outcome, "Trailing batch flushed");
            summary.add_batch(outcome);
        }

        summary.elapsed = start.elapsed();
        info!(
            records = summary.total_records,
            successes = summary.total_successes,
            errors = summary.total_errors,
            dropped = summary.total_dropped,
            "Producer finished"
        );

        Ok(summary)
    }
}
