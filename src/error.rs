//! Error types for the consumer and producer

use crate::client::KinesisClientError;
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::task::JoinError;

/// Main error type for fan-out operations
#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("Failed to list shards for stream {stream}: {source}")]
    ListShardsFailed {
        stream: String,
        #[source]
        source: KinesisClientError,
    },

    #[error("Failed to get iterator for shard {shard_id}: {source}")]
    GetIteratorFailed {
        shard_id: String,
        #[source]
        source: KinesisClientError,
    },

    #[error("Failed to get records from shard {shard_id}: {source}")]
    GetRecordsFailed {
        shard_id: String,
        #[source]
        source: KinesisClientError,
    },

    #[error("Failed to put records to stream {stream}: {source}")]
    PutRecordsFailed {
        stream: String,
        #[source]
        source: KinesisClientError,
    },

    #[error("Batch of {0} records is outside the allowed range 1..=500")]
    InvalidBatchSize(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to read input: {0}")]
    Csv(#[from] csv::Error),

    #[error("Worker {worker} did not complete: {reason}")]
    WorkerAborted { worker: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FanoutError {
    /// Whether the underlying service error was a throttling signal
    pub fn is_throttled(&self) -> bool {
        match self {
            FanoutError::GetIteratorFailed { source, .. }
            | FanoutError::GetRecordsFailed { source, .. }
            | FanoutError::PutRecordsFailed { source, .. }
            | FanoutError::ListShardsFailed { source, .. } => source.is_throttled(),
            _ => false,
        }
    }
}

/// Result type for fan-out operations
pub type Result<T> = std::result::Result<T, FanoutError>;

impl From<AcquireError> for FanoutError {
    fn from(err: AcquireError) -> Self {
        FanoutError::Other(err.into())
    }
}

impl From<JoinError> for FanoutError {
    fn from(err: JoinError) -> Self {
        FanoutError::Other(err.into())
    }
}
