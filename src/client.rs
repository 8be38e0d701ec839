//! The Kinesis service boundary consumed by the consumer and producer

use crate::consumer::IteratorPosition;
use crate::producer::RecordEnvelope;
use async_trait::async_trait;
use aws_sdk_kinesis::{
    error::{ProvideErrorMetadata, SdkError},
    primitives::Blob,
    types::{PutRecordsRequestEntry, Record, Shard},
    Client,
};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors returned by a [`KinesisClientTrait`] implementation
#[derive(Debug, Clone, Error)]
pub enum KinesisClientError {
    #[error("Provisioned throughput exceeded")]
    ThroughputExceeded,

    #[error("Iterator expired")]
    ExpiredIterator,

    #[error("Access denied")]
    AccessDenied,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("{0}")]
    Other(String),
}

impl KinesisClientError {
    /// Throttling is the only recoverable class: back off and retry the same call
    pub fn is_throttled(&self) -> bool {
        matches!(self, KinesisClientError::ThroughputExceeded)
    }
}

/// Outcome of a single `PutRecords` call as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PutRecordsResult {
    /// Entries the service accepted
    pub accepted_count: usize,
    /// Entries the service rejected inside an otherwise successful call
    pub failed_count: usize,
}

#[async_trait]
pub trait KinesisClientTrait: Send + Sync {
    async fn list_shards(&self, stream_name: &str) -> Result<Vec<Shard>, KinesisClientError>;

    async fn get_shard_iterator(
        &self,
        stream_name: &str,
        shard_id: &str,
        position: &IteratorPosition,
    ) -> Result<String, KinesisClientError>;

    async fn get_records(
        &self,
        iterator: &str,
        limit: i32,
    ) -> Result<(Vec<Record>, Option<String>), KinesisClientError>;

    async fn put_records(
        &self,
        stream_name: &str,
        envelopes: &[RecordEnvelope],
    ) -> Result<PutRecordsResult, KinesisClientError>;
}

#[async_trait]
impl KinesisClientTrait for Client {
    async fn list_shards(&self, stream_name: &str) -> Result<Vec<Shard>, KinesisClientError> {
        let mut shards = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            // ListShards rejects a stream name alongside a continuation token
            let request = match next_token.take() {
                Some(token) => self.list_shards().next_token(token),
                None => self.list_shards().stream_name(stream_name),
            };

            let response = request.send().await.map_err(classify_sdk_error)?;
            shards.extend(response.shards().iter().cloned());

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(stream = %stream_name, shard_count = shards.len(), "Listed shards");
        Ok(shards)
    }

    async fn get_shard_iterator(
        &self,
        stream_name: &str,
        shard_id: &str,
        position: &IteratorPosition,
    ) -> Result<String, KinesisClientError> {
        let mut req = self
            .get_shard_iterator()
            .stream_name(stream_name)
            .shard_id(shard_id)
            .shard_iterator_type(position.iterator_type());

        match position {
            IteratorPosition::AtSequenceNumber(seq) | IteratorPosition::AfterSequenceNumber(seq) => {
                req = req.starting_sequence_number(seq.as_str());
            }
            IteratorPosition::AtTimestamp(ts) => {
                let system_time: SystemTime = (*ts).into();
                req = req.timestamp(aws_smithy_types::DateTime::from(system_time));
            }
            IteratorPosition::TrimHorizon | IteratorPosition::Latest => {}
        }

        let response = req.send().await.map_err(classify_sdk_error)?;
        response.shard_iterator().map(String::from).ok_or_else(|| {
            KinesisClientError::Other(format!("No iterator returned for shard {}", shard_id))
        })
    }

    async fn get_records(
        &self,
        iterator: &str,
        limit: i32,
    ) -> Result<(Vec<Record>, Option<String>), KinesisClientError> {
        let response = self
            .get_records()
            .shard_iterator(iterator)
            .limit(limit)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        trace!(
            record_count = response.records().len(),
            millis_behind = ?response.millis_behind_latest(),
            "Fetched records"
        );

        Ok((
            response.records().to_vec(),
            response.next_shard_iterator().map(String::from),
        ))
    }

    async fn put_records(
        &self,
        stream_name: &str,
        envelopes: &[RecordEnvelope],
    ) -> Result<PutRecordsResult, KinesisClientError> {
        let entries = envelopes
            .iter()
            .map(|envelope| {
                PutRecordsRequestEntry::builder()
                    .data(Blob::new(envelope.data.clone()))
                    .partition_key(envelope.partition_key.as_str())
                    .build()
                    .map_err(|e| KinesisClientError::InvalidArgument(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let response = self
            .put_records()
            .stream_name(stream_name)
            .set_records(Some(entries))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let submitted = response.records().len();
        let failed = response.failed_record_count().unwrap_or(0).max(0) as usize;

        Ok(PutRecordsResult {
            accepted_count: submitted.saturating_sub(failed),
            failed_count: failed,
        })
    }
}

/// Map an SDK error onto the client taxonomy by its service error code
fn classify_sdk_error<E>(err: SdkError<E>) -> KinesisClientError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(context) => {
            let service_err = context.err();
            let message = service_err.message().unwrap_or_default().to_string();
            match service_err.code() {
                Some("ProvisionedThroughputExceededException") => {
                    KinesisClientError::ThroughputExceeded
                }
                Some("ExpiredIteratorException") => KinesisClientError::ExpiredIterator,
                Some("AccessDeniedException") => KinesisClientError::AccessDenied,
                Some("ResourceNotFoundException") => KinesisClientError::ResourceNotFound(message),
                Some("InvalidArgumentException") => KinesisClientError::InvalidArgument(message),
                Some(code) => KinesisClientError::Other(format!("{}: {}", code, message)),
                None => KinesisClientError::Other(message),
            }
        }
        SdkError::TimeoutError(_) => KinesisClientError::Timeout(format!("{:?}", err)),
        SdkError::DispatchFailure(failure) => {
            KinesisClientError::ConnectionError(format!("{:?}", failure))
        }
        _ => KinesisClientError::Other(format!("{:?}", err)),
    }
}
