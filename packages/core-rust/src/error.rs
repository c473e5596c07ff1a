//! Error taxonomy shared by every pipeline stage.

use crate::types::Stage;

/// Errors raised by an individual stage while validating or executing its work.
///
/// Each variant carries a human-readable message. Stages fail fast on bad
/// input and never retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid bound: {message}")]
    InvalidBound { message: String },
    #[error("invalid duration: {message}")]
    InvalidDuration { message: String },
    #[error("invalid term count: {message}")]
    InvalidTermCount { message: String },
    #[error("task failure: {message}")]
    TaskFailure { message: String },
}

impl PipelineError {
    pub fn invalid_bound(message: impl Into<String>) -> Self {
        Self::InvalidBound {
            message: message.into(),
        }
    }

    pub fn invalid_duration(message: impl Into<String>) -> Self {
        Self::InvalidDuration {
            message: message.into(),
        }
    }

    pub fn invalid_term_count(message: impl Into<String>) -> Self {
        Self::InvalidTermCount {
            message: message.into(),
        }
    }

    pub fn task_failure(message: impl Into<String>) -> Self {
        Self::TaskFailure {
            message: message.into(),
        }
    }

    /// Returns `true` for errors caused by caller input rather than execution.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::TaskFailure { .. })
    }

    /// Returns the message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidBound { message }
            | Self::InvalidDuration { message }
            | Self::InvalidTermCount { message }
            | Self::TaskFailure { message } => message,
        }
    }
}

/// A stage error annotated with the stage that produced it.
///
/// This is the only wrapping applied on the way to the orchestrator's caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl PipelineFailure {
    #[must_use]
    pub fn new(stage: Stage, error: PipelineError) -> Self {
        Self { stage, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_variant_and_message() {
        let err = PipelineError::invalid_bound("bound must be greater than 2, got 1");
        assert_eq!(
            err.to_string(),
            "invalid bound: bound must be greater than 2, got 1"
        );
        assert_eq!(err.message(), "bound must be greater than 2, got 1");
    }

    #[test]
    fn only_task_failure_is_not_validation() {
        assert!(PipelineError::invalid_bound("x").is_validation());
        assert!(PipelineError::invalid_duration("x").is_validation());
        assert!(PipelineError::invalid_term_count("x").is_validation());
        assert!(!PipelineError::task_failure("x").is_validation());
    }

    #[test]
    fn failure_names_the_stage() {
        let failure = PipelineFailure::new(
            Stage::Delaying,
            PipelineError::invalid_duration("20 exceeds the maximum of 10 seconds"),
        );
        assert_eq!(
            failure.to_string(),
            "delay stage failed: invalid duration: 20 exceeds the maximum of 10 seconds"
        );
        assert!(std::error::Error::source(&failure).is_some());
    }
}
