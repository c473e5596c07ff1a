//! Parallel aggregator: fans out one task per series term and sums the results.
//!
//! At most `max_in_flight` term tasks run at once. The consumer joins results
//! in arrival order and refills the window until every index in
//! `0..=term_count` has been evaluated. Only the consumer touches the running
//! sum; producer tasks just return their term.
//!
//! Arrival order varies between runs and floating-point addition is not
//! associative, so two runs over the same input may differ in the last few
//! bits of the result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use heavylift_core::series::term;
use heavylift_core::PipelineError;
use tokio::task::JoinSet;
use tracing::debug;

/// Computes one summand from its index.
pub type TermFn = fn(u64) -> f64;

#[derive(Debug)]
pub struct ParallelAggregator {
    max_in_flight: usize,
    deadline: Option<Duration>,
    evaluator: TermFn,
    launched: AtomicU64,
}

impl ParallelAggregator {
    /// Creates an aggregator over the Leibniz series terms.
    ///
    /// A `max_in_flight` of zero is treated as one.
    #[must_use]
    pub fn new(max_in_flight: usize, deadline: Option<Duration>) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
            deadline,
            evaluator: term,
            launched: AtomicU64::new(0),
        }
    }

    /// Replaces the per-index term function.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: TermFn) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Total number of term tasks spawned over the aggregator's lifetime.
    #[must_use]
    pub fn tasks_launched(&self) -> u64 {
        self.launched.load(Ordering::Relaxed)
    }

    /// Sums terms `0..=term_count`, each computed on its own task.
    ///
    /// # Errors
    ///
    /// `InvalidTermCount` when `term_count < 0`. `TaskFailure` when any term
    /// task panics or the configured deadline elapses; no partial sum is
    /// returned and the remaining tasks are aborted.
    pub async fn approximate(&self, term_count: i64) -> Result<f64, PipelineError> {
        let last = u64::try_from(term_count).map_err(|_| {
            PipelineError::invalid_term_count(format!(
                "term count must not be negative, got {term_count}"
            ))
        })?;

        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.fan_out(last))
                .await
                .map_err(|_| {
                    PipelineError::task_failure(format!(
                        "aggregation did not complete within {}ms",
                        deadline.as_millis()
                    ))
                })?,
            None => self.fan_out(last).await,
        }
    }

    async fn fan_out(&self, last: u64) -> Result<f64, PipelineError> {
        let evaluator = self.evaluator;
        let mut indices = 0..=last;
        let mut tasks = JoinSet::new();
        let mut sum = 0.0;
        let mut received: u64 = 0;

        loop {
            while tasks.len() < self.max_in_flight {
                let Some(k) = indices.next() else { break };
                tasks.spawn(async move { evaluator(k) });
                self.launched.fetch_add(1, Ordering::Relaxed);
            }

            match tasks.join_next().await {
                Some(Ok(value)) => {
                    sum += value;
                    received += 1;
                }
                Some(Err(e)) => {
                    tasks.abort_all();
                    return Err(PipelineError::task_failure(format!(
                        "term task failed after {received} results: {e}"
                    )));
                }
                None => break,
            }
        }

        debug!(terms = received, "aggregation complete");
        Ok(sum)
    }
}
