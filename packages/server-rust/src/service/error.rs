use heavylift_core::PipelineFailure;

/// Errors returned by the pipeline service stack.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A stage rejected its input or failed while running.
    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),
    /// The concurrent pipeline limit was reached.
    #[error("server overloaded, try again later")]
    Overloaded,
}

impl ServiceError {
    /// Short label for logs and metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pipeline(failure) if failure.error.is_validation() => "rejected",
            Self::Pipeline(_) => "failed",
            Self::Overloaded => "overloaded",
        }
    }
}
