use std::fmt;

use serde::{Deserialize, Serialize};

/// Already-parsed inputs for one pipeline run.
///
/// Values are signed so that each stage can reject out-of-range input
/// itself instead of relying on the caller to have validated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Exclusive upper limit for the prime search.
    pub bound: i64,
    /// How long the delay stage suspends the pipeline, in seconds.
    pub delay_secs: i64,
    /// Highest term index of the series; `term_count + 1` terms are summed.
    pub term_count: i64,
}

impl PipelineRequest {
    #[must_use]
    pub fn new(bound: i64, delay_secs: i64, term_count: i64) -> Self {
        Self {
            bound,
            delay_secs,
            term_count,
        }
    }
}

/// Aggregated output of a successful pipeline run. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Largest prime strictly below the requested bound.
    pub largest_prime: u64,
    /// Seconds the delay stage slept for.
    pub delay_secs: u64,
    /// Series approximation of pi.
    pub approximation: f64,
}

/// The three work stages of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Largest-prime search over the sieve table.
    #[serde(rename = "prime_search")]
    PrimeSearch,
    /// Bounded wall-clock pause.
    #[serde(rename = "delay")]
    Delaying,
    /// Parallel series summation.
    #[serde(rename = "approximate")]
    Aggregating,
}

impl Stage {
    /// Returns the stable lowercase name used in logs and error output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimeSearch => "prime_search",
            Self::Delaying => "delay",
            Self::Aggregating => "approximate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
