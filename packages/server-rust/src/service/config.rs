use std::time::Duration;

use heavylift_core::SIEVE_CAPACITY;

/// Execution policy for the computation pipeline.
///
/// Controls input ceilings, fan-out width, and request-level concurrency.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Largest bound the prime stage will allocate a sieve table for.
    pub sieve_capacity: usize,
    /// Longest accepted delay, in seconds.
    pub max_delay_secs: u64,
    /// Maximum number of term tasks in flight at once during aggregation.
    pub max_concurrent_terms: usize,
    /// Optional upper limit on the whole aggregation. `None` waits indefinitely.
    pub aggregate_deadline: Option<Duration>,
    /// Maximum number of pipelines running at once before requests are shed.
    /// Each pipeline allocates its own sieve table.
    pub max_concurrent_pipelines: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sieve_capacity: SIEVE_CAPACITY,
            max_delay_secs: 10,
            max_concurrent_terms: 1024,
            aggregate_deadline: None,
            max_concurrent_pipelines: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.sieve_capacity, 50_000_000);
        assert_eq!(config.max_delay_secs, 10);
        assert_eq!(config.max_concurrent_terms, 1024);
        assert!(config.aggregate_deadline.is_none());
        assert_eq!(config.max_concurrent_pipelines, 4);
    }
}
