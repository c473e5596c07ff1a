//! Network module with deferred startup lifecycle.
//!
//! `new()` assembles shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections. Callers learn the bound port between
//! `start()` and `serve()`, which matters when port 0 is configured.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    compute_handler, health_handler, liveness_handler, metrics_handler, readiness_handler,
    AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::service::PipelineService;

/// Upper bound on how long shutdown waits for running pipelines.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the HTTP server lifecycle.
///
/// 1. `new()` -- allocates shared state (shutdown controller, app state)
/// 2. `start()` -- binds the TCP listener to the configured address
/// 3. `serve()` -- serves requests until the shutdown future resolves
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        pipeline: PipelineService,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let state = AppState {
            pipeline,
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(config.clone()),
            metrics,
            start_time: Instant::now(),
        };
        Self {
            config,
            listener: None,
            state,
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /` -- run the pipeline (`in`, `nap`, `processes`, optional `format`)
    /// - `GET /metrics` -- Prometheus exposition
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", get(compute_handler))
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(build_http_layers(&self.config))
            .with_state(self.state.clone())
    }

    /// Binds the TCP listener and returns the actual port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves, then drains running pipelines.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .context("start() must be called before serve()")?;
        let router = self.build_router();
        let controller = self.shutdown_controller();

        controller.set_ready();
        info!("Serving HTTP connections");

        let signalled = Arc::clone(&controller);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                signalled.trigger_shutdown();
            })
            .await?;

        drain(&controller).await;
        Ok(())
    }
}

async fn drain(controller: &ShutdownController) {
    controller.trigger_shutdown();
    let in_flight = controller.in_flight_count();
    if in_flight > 0 {
        info!(in_flight, "waiting for running pipelines");
    }
    if controller.wait_for_drain(DRAIN_TIMEOUT).await {
        info!("shutdown complete");
    } else {
        warn!(
            remaining = controller.in_flight_count(),
            "drain timed out with pipelines still running"
        );
    }
}
