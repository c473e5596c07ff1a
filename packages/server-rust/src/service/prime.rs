//! Prime search stage.
//!
//! The sieve is CPU-bound, so it runs on tokio's blocking pool while the
//! calling task awaits it. The stage stays sequential from the pipeline's
//! point of view.

use heavylift_core::{find_largest_prime_below, PipelineError};

/// Finds the largest prime below a bound, capped at a fixed table capacity.
#[derive(Debug, Clone)]
pub struct PrimeFinder {
    capacity: usize,
}

impl PrimeFinder {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the largest prime strictly below `bound`.
    ///
    /// # Errors
    ///
    /// `InvalidBound` when `bound <= 2` or above the capacity, `TaskFailure`
    /// if the sieve task panics.
    pub async fn find(&self, bound: i64) -> Result<u64, PipelineError> {
        let capacity = self.capacity;
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || {
            span.in_scope(|| find_largest_prime_below(bound, capacity))
        })
            .await
            .map_err(|e| PipelineError::task_failure(format!("sieve task did not complete: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_97_below_100() {
        let finder = PrimeFinder::new(1_000);
        assert_eq!(finder.find(100).await, Ok(97));
    }

    #[tokio::test]
    async fn rejects_bound_above_capacity() {
        let finder = PrimeFinder::new(1_000);
        let err = finder.find(5_000).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidBound { .. }));
    }

    #[tokio::test]
    async fn rejects_bound_of_one() {
        let finder = PrimeFinder::new(1_000);
        let err = finder.find(1).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidBound { .. }));
    }
}
