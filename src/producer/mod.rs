//! Batching producer
//!
//! Records are read from a source, assigned a partition key, serialized to
//! JSON and written with one PutRecords call per batch.

mod batch;
mod partition;
mod pipeline;
mod record;
mod source;

pub use batch::{BatchOutcome, BatchProducer, ThrottlePolicy, MAX_BATCH_SIZE};
pub use partition::{random_partition_key, PartitionKeyResolver};
pub use pipeline::{ProducerPipeline, ProducerSummary};
pub use record::{Record, RecordEnvelope};
pub use source::CsvRecordSource;
