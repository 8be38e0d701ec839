//! Kinesis Fanout - parallel shard reading and batched writing for AWS Kinesis
//!
//! The consumer side discovers a stream's shards and polls each one from its
//! own worker for a fixed duration, with a bound on how many workers run at
//! once. The producer side reads delimited records, assigns partition keys and
//! writes them in PutRecords batches.

pub mod client;
pub mod config;
pub mod consumer;
pub mod error;
pub mod producer;
pub mod retry;

// Make test utilities available for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test;
#[cfg(test)]
mod tests;

pub use client::{KinesisClientError, KinesisClientTrait, PutRecordsResult};
pub use config::{ConsumerConfig, ProducerConfig};
pub use consumer::{
    ConsumerSummary, DiscardSink, EchoSink, IteratorPosition, KinesisConsumer, RecordSink,
    ShardPoller, ShardWorkerPool, ShardWorkerSpec,
};
pub use error::{FanoutError, Result};
pub use producer::{
    BatchOutcome, BatchProducer, CsvRecordSource, PartitionKeyResolver, ProducerPipeline,
    ProducerSummary, Record, RecordEnvelope, ThrottlePolicy,
};
pub use retry::{Backoff, FixedBackoff};
