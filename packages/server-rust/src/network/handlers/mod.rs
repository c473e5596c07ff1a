//! HTTP handler definitions for the `Heavylift` server.
//!
//! Defines `AppState` (the shared state carried through axum extractors) and
//! re-exports the handler functions used to build the router.

pub mod compute;
pub mod health;
pub mod metrics;

pub use compute::compute_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use metrics::metrics_handler;

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;

use super::{NetworkConfig, ShutdownController};
use crate::service::PipelineService;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline wrapped in its middleware stack.
    pub pipeline: PipelineService,
    /// Health state and in-flight request tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Network configuration (bind address, colour, timeouts).
    pub config: Arc<NetworkConfig>,
    /// Prometheus renderer. `None` when no recorder was installed.
    pub metrics: Option<PrometheusHandle>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
