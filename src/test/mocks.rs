use crate::client::{KinesisClientError, KinesisClientTrait, PutRecordsResult};
use crate::consumer::{IteratorPosition, RecordSink};
use crate::producer::RecordEnvelope;
use async_trait::async_trait;
use aws_sdk_kinesis::types::{Record, Shard};
use parking_lot::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicUsize, Ordering},
    sync::Arc,
    time::Duration,
};
use tracing::debug;

type PageResponse = Result<Vec<Record>, KinesisClientError>;

/// Scripted behaviour of one shard
#[derive(Debug, Default)]
struct ShardScript {
    iterator_responses: VecDeque<Result<String, KinesisClientError>>,
    pages: VecDeque<PageResponse>,
    closed: bool,
    issued: usize,
}

impl ShardScript {
    fn issue_iterator(&mut self, shard_id: &str) -> String {
        let iterator = format!("{}-iterator-{}", shard_id, self.issued);
        self.issued += 1;
        iterator
    }
}

#[derive(Debug, Default)]
struct MockState {
    list_shards_responses: VecDeque<Result<Vec<Shard>, KinesisClientError>>,
    shards: HashMap<String, ShardScript>,
    iterator_owner: HashMap<String, String>,
    seen_iterators: Vec<String>,
    requested_limits: Vec<i32>,
    put_responses: VecDeque<Result<PutRecordsResult, KinesisClientError>>,
    put_batches: Vec<Vec<RecordEnvelope>>,
}

/// Mock Kinesis client for testing
///
/// Each shard replays its scripted pages in order. Once a script runs out the
/// shard keeps answering with empty pages, unless it was closed, in which
/// case the last page carries no next iterator.
#[derive(Debug, Default, Clone)]
pub struct MockKinesisClient {
    state: Arc<Mutex<MockState>>,
    iterator_request_count: Arc<AtomicUsize>,
    get_records_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    get_records_delay: Option<Duration>,
}

impl MockKinesisClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every GetRecords call sleeps `delay` before answering
    pub fn new_with_delay(delay: Duration) -> Self {
        Self {
            get_records_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn mock_list_shards(&self, response: Result<Vec<Shard>, KinesisClientError>) {
        self.state.lock().list_shards_responses.push_back(response);
    }

    pub fn mock_get_iterator(&self, shard_id: &str, response: Result<String, KinesisClientError>) {
        self.state
            .lock()
            .shards
            .entry(shard_id.to_string())
            .or_default()
            .iterator_responses
            .push_back(response);
    }

    pub fn mock_shard_pages(&self, shard_id: &str, pages: Vec<PageResponse>) {
        self.state
            .lock()
            .shards
            .entry(shard_id.to_string())
            .or_default()
            .pages
            .extend(pages);
    }

    pub fn close_shard_after_script(&self, shard_id: &str) {
        self.state
            .lock()
            .shards
            .entry(shard_id.to_string())
            .or_default()
            .closed = true;
    }

    pub fn mock_put_records(&self, response: Result<PutRecordsResult, KinesisClientError>) {
        self.state.lock().put_responses.push_back(response);
    }

    pub fn get_iterator_request_count(&self) -> usize {
        self.iterator_request_count.load(Ordering::SeqCst)
    }

    pub fn get_records_call_count(&self) -> usize {
        self.get_records_calls.load(Ordering::SeqCst)
    }

    /// Iterators passed to GetRecords, in call order
    pub fn seen_iterators(&self) -> Vec<String> {
        self.state.lock().seen_iterators.clone()
    }

    pub fn requested_limits(&self) -> Vec<i32> {
        self.state.lock().requested_limits.clone()
    }

    /// Highest number of GetRecords calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn put_batches(&self) -> Vec<Vec<RecordEnvelope>> {
        self.state.lock().put_batches.clone()
    }
}

#[async_trait]
impl KinesisClientTrait for MockKinesisClient {
    async fn list_shards(&self, _stream_name: &str) -> Result<Vec<Shard>, KinesisClientError> {
        self.state
            .lock()
            .list_shards_responses
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn get_shard_iterator(
        &self,
        _stream_name: &str,
        shard_id: &str,
        position: &IteratorPosition,
    ) -> Result<String, KinesisClientError> {
        self.iterator_request_count.fetch_add(1, Ordering::SeqCst);
        debug!(shard_id = %shard_id, position = %position, "Mock iterator requested");

        let mut state = self.state.lock();
        let script = state.shards.entry(shard_id.to_string()).or_default();
        let iterator = match script.iterator_responses.pop_front() {
            Some(response) => response?,
            None => script.issue_iterator(shard_id),
        };
        state
            .iterator_owner
            .insert(iterator.clone(), shard_id.to_string());
        Ok(iterator)
    }

    async fn get_records(
        &self,
        iterator: &str,
        limit: i32,
    ) -> Result<(Vec<Record>, Option<String>), KinesisClientError> {
        self.get_records_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.get_records_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut state = self.state.lock();
        state.seen_iterators.push(iterator.to_string());
        state.requested_limits.push(limit);

        let shard_id = state
            .iterator_owner
            .get(iterator)
            .cloned()
            .ok_or_else(|| KinesisClientError::InvalidArgument(format!("unknown iterator {}", iterator)))?;

        let script = state.shards.entry(shard_id.clone()).or_default();
        let (records, next) = match script.pages.pop_front() {
            // a failed call leaves the caller's iterator valid
            Some(Err(e)) => return Err(e),
            Some(Ok(records)) => {
                let next = if script.closed && script.pages.is_empty() {
                    None
                } else {
                    Some(script.issue_iterator(&shard_id))
                };
                (records, next)
            }
            None if script.closed => (vec![], None),
            None => (vec![], Some(script.issue_iterator(&shard_id))),
        };

        if let Some(next) = &next {
            state.iterator_owner.insert(next.clone(), shard_id);
        }
        Ok((records, next))
    }

    async fn put_records(
        &self,
        _stream_name: &str,
        envelopes: &[RecordEnvelope],
    ) -> Result<PutRecordsResult, KinesisClientError> {
        let mut state = self.state.lock();
        state.put_batches.push(envelopes.to_vec());
        state.put_responses.pop_front().unwrap_or_else(|| {
            Ok(PutRecordsResult {
                accepted_count: envelopes.len(),
                failed_count: 0,
            })
        })
    }
}

/// Sink that keeps every page it receives
#[derive(Debug, Default)]
pub struct CollectingSink {
    pages: Mutex<Vec<(String, Vec<Record>)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worker name and page size of every page, in arrival order
    pub fn batches(&self) -> Vec<(String, usize)> {
        self.pages
            .lock()
            .iter()
            .map(|(worker, records)| (worker.clone(), records.len()))
            .collect()
    }

    pub fn records(&self) -> Vec<Record> {
        self.pages
            .lock()
            .iter()
            .flat_map(|(_, records)| records.iter().cloned())
            .collect()
    }
}

impl RecordSink for CollectingSink {
    fn accept(&self, worker: &str, records: &[Record]) {
        self.pages.lock().push((worker.to_string(), records.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestUtils;

    #[tokio::test]
    async fn test_mock_kinesis_client() -> Result<(), KinesisClientError> {
        let client = MockKinesisClient::new();
        client.mock_list_shards(Ok(vec![TestUtils::create_test_shard("shard-1")]));
        client.mock_shard_pages("shard-1", vec![Ok(TestUtils::create_test_records(2))]);

        let shards = client.list_shards("test-stream").await?;
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].shard_id(), "shard-1");

        let iterator = client
            .get_shard_iterator("test-stream", "shard-1", &IteratorPosition::TrimHorizon)
            .await?;
        assert_eq!(iterator, "shard-1-iterator-0");

        let (records, next) = client.get_records(&iterator, 25).await?;
        assert_eq!(records.len(), 2);
        assert_eq!(next.as_deref(), Some("shard-1-iterator-1"));

        // script exhausted, open shard keeps answering
        let (records, next) = client.get_records("shard-1-iterator-1", 25).await?;
        assert!(records.is_empty());
        assert!(next.is_some());

        assert_eq!(client.get_records_call_count(), 2);
        assert_eq!(client.requested_limits(), vec![25, 25]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_iterator_is_rejected() {
        let client = MockKinesisClient::new();
        let result = client.get_records("bogus", 10).await;
        assert!(matches!(result, Err(KinesisClientError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_closed_shard_ends_with_no_iterator() -> Result<(), KinesisClientError> {
        let client = MockKinesisClient::new();
        client.close_shard_after_script("shard-1");

        let iterator = client
            .get_shard_iterator("test-stream", "shard-1", &IteratorPosition::Latest)
            .await?;
        let (records, next) = client.get_records(&iterator, 10).await?;
        assert!(records.is_empty());
        assert_eq!(next, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_put_records_defaults_to_accepting() -> Result<(), KinesisClientError> {
        let client = MockKinesisClient::new();
        let envelopes = vec![RecordEnvelope {
            data: b"{}".to_vec(),
            partition_key: "pk".to_string(),
        }];

        let result = client.put_records("test-stream", &envelopes).await?;
        assert_eq!(result.accepted_count, 1);
        assert_eq!(result.failed_count, 0);
        assert_eq!(client.put_batches(), vec![envelopes]);
        Ok(())
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.accept("shard_worker:0", &TestUtils::create_test_records(3));
        sink.accept("shard_worker:1", &TestUtils::create_test_records(1));

        assert_eq!(
            sink.batches(),
            vec![
                ("shard_worker:0".to_string(), 3),
                ("shard_worker:1".to_string(), 1)
            ]
        );
        assert_eq!(sink.records().len(), 4);
    }
}
