//! Tower middleware layers for the pipeline service.
//!
//! - [`load_shed`]: Semaphore-based limit on concurrent pipelines
//! - [`metrics`]: Request timing and outcome counting
//! - [`stack`]: Composes all layers around the orchestrator

pub mod load_shed;
pub mod metrics;
pub mod stack;

pub use load_shed::LoadShedLayer;
pub use metrics::MetricsLayer;
pub use stack::{build_pipeline_service, PipelineService};
