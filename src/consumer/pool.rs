//! Bounded pool of shard workers
//!
//! Every spec gets its own task in a `JoinSet`, but a task only starts
//! polling once it holds a semaphore permit, so at most `max_concurrency`
//! shards are read at the same time. Results are gathered as tasks finish by
//! a single aggregating loop; a failed or panicking worker is logged and left
//! out of the total without disturbing its siblings.

use super::poller::{PollResult, ShardPoller};
use super::worker::ShardWorkerSpec;
use crate::client::KinesisClientTrait;
use crate::error::{FanoutError, Result};
use crate::retry::{Backoff, FixedBackoff};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default number of shard workers allowed to run at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Aggregated outcome of a pool run
#[derive(Debug, Default)]
pub struct PoolSummary {
    /// Sum of records read by every successful worker
    pub total_records: u64,
    /// One entry per worker, in completion order
    pub outcomes: Vec<PollResult>,
}

impl PoolSummary {
    pub fn failures(&self) -> impl Iterator<Item = &PollResult> {
        self.outcomes.iter().filter(|result| !result.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.len() - self.failed_count()
    }
}

/// Runs one [`ShardPoller`] per spec with bounded concurrency
pub struct ShardWorkerPool<C, B = FixedBackoff>
where
    C: KinesisClientTrait,
    B: Backoff,
{
    poller: Arc<ShardPoller<C, B>>,
}

impl<C, B> ShardWorkerPool<C, B>
where
    C: KinesisClientTrait + 'static,
    B: Backoff + 'static,
{
    pub fn new(poller: ShardPoller<C, B>) -> Self {
        Self {
            poller: Arc::new(poller),
        }
    }

    /// Run every spec to completion and sum the records they read
    pub async fn run(
        &self,
        specs: Vec<ShardWorkerSpec>,
        max_concurrency: usize,
    ) -> Result<PoolSummary> {
        if max_concurrency == 0 {
            return Err(FanoutError::ConfigError(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        info!(
            workers = specs.len(),
            max_concurrency = max_concurrency,
            "Starting shard workers"
        );

        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let mut workers = JoinSet::new();

        for spec in specs {
            let poller = self.poller.clone();
            let semaphore = semaphore.clone();

            workers.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return aborted(&spec, e.into()),
                };
                debug!(worker = %spec.name(), "Worker acquired permit");

                match AssertUnwindSafe(poller.poll(&spec)).catch_unwind().await {
                    Ok(result) => result,
                    Err(_) => aborted(
                        &spec,
                        FanoutError::WorkerAborted {
                            worker: spec.name().to_string(),
                            reason: "poller panicked".to_string(),
                        },
                    ),
                }
            });
        }

        let mut summary = PoolSummary::default();

        // tasks catch their own panics and are never aborted, so a join
        // error only happens when the runtime is shutting down
        while let Some(joined) = workers.join_next().await {
            let result = joined?;

            match &result.outcome {
                Ok(count) => {
                    summary.total_records += count;
                    info!(worker = %result.worker, records = count, "Worker returned records");
                }
                Err(e) => {
                    warn!(
                        worker = %result.worker,
                        shard_id = %result.shard_id,
                        error = %e,
                        "Worker generated an error, excluding it from the total"
                    );
                }
            }

            summary.outcomes.push(result);
        }

        info!(
            total_records = summary.total_records,
            failed_workers = summary.failed_count(),
            "All shard workers finished"
        );

        Ok(summary)
    }
}

fn aborted(spec: &ShardWorkerSpec, error: FanoutError) -> PollResult {
    PollResult {
        worker: spec.name().to_string(),
        shard_id: spec.shard_id().to_string(),
        outcome: Err(error),
    }
}
