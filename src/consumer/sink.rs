use aws_sdk_kinesis::types::Record;
use tracing::info;

/// Receives every non-empty page of records a shard worker fetches
pub trait RecordSink: Send + Sync {
    fn accept(&self, worker: &str, records: &[Record]);
}

/// Echoes each record's payload to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoSink;

impl RecordSink for EchoSink {
    fn accept(&self, worker: &str, records: &[Record]) {
        info!(worker = %worker, count = records.len(), "Worker got records");
        for record in records {
            let text = String::from_utf8_lossy(record.data().as_ref());
            info!(
                worker = %worker,
                sequence = %record.sequence_number(),
                partition_key = %record.partition_key(),
                "echo record: {}",
                text
            );
        }
    }
}

/// Drops records without looking at them
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl RecordSink for DiscardSink {
    fn accept(&self, _worker: &str, _records: &[Record]) {}
}
