//! Stack composition: wraps the orchestrator with all middleware layers.

use std::sync::Arc;

use heavylift_core::{PipelineRequest, PipelineResult};
use tower::util::BoxCloneSyncService;
use tower::ServiceBuilder;

use super::load_shed::LoadShedLayer;
use super::metrics::MetricsLayer;
use crate::service::config::PipelineConfig;
use crate::service::error::ServiceError;
use crate::service::pipeline::{OrchestratorService, PipelineOrchestrator};

/// Type-erased, cloneable pipeline service shared by HTTP handlers.
pub type PipelineService = BoxCloneSyncService<PipelineRequest, PipelineResult, ServiceError>;

/// Build the pipeline service by wrapping the orchestrator with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when too many pipelines are running
/// 2. `MetricsLayer` -- record timing and outcome of admitted requests
#[must_use]
pub fn build_pipeline_service(
    orchestrator: Arc<PipelineOrchestrator>,
    config: &PipelineConfig,
) -> PipelineService {
    let svc = ServiceBuilder::new()
        .layer(LoadShedLayer::new(config.max_concurrent_pipelines))
        .layer(MetricsLayer)
        .service(OrchestratorService::new(orchestrator));
    BoxCloneSyncService::new(svc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
