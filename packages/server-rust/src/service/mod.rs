//! Computation pipeline and its execution framework.
//!
//! 1. **Stages**: `prime` (sieve search), `delay` (bounded pause),
//!    `aggregator` (parallel series summation)
//! 2. **Orchestration** (`pipeline`): sequences the stages with tracing and counters
//! 3. **Middleware** (`middleware`): Tower layers (load shedding, metrics)

pub mod aggregator;
pub mod config;
pub mod delay;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod prime;

pub use aggregator::ParallelAggregator;
pub use config::PipelineConfig;
pub use delay::DelayStage;
pub use error::ServiceError;
pub use middleware::{build_pipeline_service, PipelineService};
pub use pipeline::{OrchestratorService, PipelineOrchestrator};
pub use prime::PrimeFinder;
