//! Delay stage: suspends the pipeline for a bounded number of seconds.
//!
//! Uses `tokio::time::sleep`, so the wait parks the task instead of a thread.

use std::time::Duration;

use heavylift_core::PipelineError;

#[derive(Debug, Clone)]
pub struct DelayStage {
    max_secs: u64,
}

impl DelayStage {
    #[must_use]
    pub fn new(max_secs: u64) -> Self {
        Self { max_secs }
    }

    /// Checks `secs` against `[0, max_secs]` and converts it to a `Duration`.
    ///
    /// # Errors
    ///
    /// `InvalidDuration` for negative values or values above the maximum.
    pub fn validate(&self, secs: i64) -> Result<Duration, PipelineError> {
        let secs = u64::try_from(secs).map_err(|_| {
            PipelineError::invalid_duration(format!("delay must not be negative, got {secs}"))
        })?;
        if secs > self.max_secs {
            return Err(PipelineError::invalid_duration(format!(
                "{secs} exceeds the maximum of {} seconds",
                self.max_secs
            )));
        }
        Ok(Duration::from_secs(secs))
    }

    /// Sleeps for `secs` seconds and returns the slept duration in seconds.
    ///
    /// # Errors
    ///
    /// Same as [`DelayStage::validate`]; nothing is slept on error.
    pub async fn delay(&self, secs: i64) -> Result<u64, PipelineError> {
        let duration = self.validate(secs)?;
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
        Ok(duration.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_and_too_long() {
        let stage = DelayStage::new(10);
        assert!(matches!(
            stage.validate(-1),
            Err(PipelineError::InvalidDuration { .. })
        ));
        assert!(matches!(
            stage.validate(11),
            Err(PipelineError::InvalidDuration { .. })
        ));
        assert_eq!(stage.validate(10), Ok(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn zero_returns_immediately() {
        let stage = DelayStage::new(10);
        let start = std::time::Instant::now();
        assert_eq!(stage.delay(0).await, Ok(0));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_for_the_requested_duration() {
        let stage = DelayStage::new(10);
        let start = tokio::time::Instant::now();
        assert_eq!(stage.delay(3).await, Ok(3));
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_duration_does_not_sleep() {
        let stage = DelayStage::new(10);
        let start = tokio::time::Instant::now();
        assert!(stage.delay(20).await.is_err());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
