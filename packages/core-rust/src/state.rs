//! Pipeline state machine.
//!
//! `Idle -> PrimeSearch -> Delaying -> Aggregating -> Done`, with `Error`
//! reachable from any working stage. `Done` and `Error` are terminal.

use std::fmt;

use crate::types::Stage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineState {
    /// Created, no stage entered yet.
    #[default]
    Idle,
    PrimeSearch,
    Delaying,
    Aggregating,
    /// All stages completed successfully.
    Done,
    /// Aborted; carries the stage that failed.
    Error(Stage),
}

impl PipelineState {
    /// Moves to the next state after the current one completes successfully.
    ///
    /// Terminal states stay where they are.
    #[must_use]
    pub fn advance(self) -> Self {
        match self {
            Self::Idle => Self::PrimeSearch,
            Self::PrimeSearch => Self::Delaying,
            Self::Delaying => Self::Aggregating,
            Self::Aggregating | Self::Done => Self::Done,
            Self::Error(stage) => Self::Error(stage),
        }
    }

    /// Moves to `Error` from the current working stage.
    ///
    /// Failing from `Idle` attributes the error to the first stage; terminal
    /// states are absorbing.
    #[must_use]
    pub fn fail(self) -> Self {
        match self {
            Self::Idle | Self::PrimeSearch => Self::Error(Stage::PrimeSearch),
            Self::Delaying => Self::Error(Stage::Delaying),
            Self::Aggregating => Self::Error(Stage::Aggregating),
            terminal @ (Self::Done | Self::Error(_)) => terminal,
        }
    }

    /// The working stage for this state, if any.
    #[must_use]
    pub fn stage(self) -> Option<Stage> {
        match self {
            Self::PrimeSearch => Some(Stage::PrimeSearch),
            Self::Delaying => Some(Stage::Delaying),
            Self::Aggregating => Some(Stage::Aggregating),
            Self::Idle | Self::Done | Self::Error(_) => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PrimeSearch => "prime_search",
            Self::Delaying => "delaying",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
            Self::Error(_) => "error",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(stage) => write!(f, "error({stage})"),
            other => f.write_str(other.as_str()),
        }
    }
}
