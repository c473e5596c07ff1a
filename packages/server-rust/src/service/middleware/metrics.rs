//! Metrics middleware for pipeline requests.
//!
//! Wraps each request in a `tracing` span with its duration and outcome, and
//! records the same through the `metrics` facade:
//! `heavylift_pipeline_duration_seconds` (histogram) and
//! `heavylift_pipeline_outcomes_total{outcome}` (counter).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use heavylift_core::{PipelineRequest, PipelineResult};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::error::ServiceError;

pub const DURATION_HISTOGRAM: &str = "heavylift_pipeline_duration_seconds";
pub const OUTCOME_COUNTER: &str = "heavylift_pipeline_outcomes_total";

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records pipeline duration and outcome.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<PipelineRequest> for MetricsService<S>
where
    S: Service<PipelineRequest, Response = PipelineResult, Error = ServiceError> + Send,
    S::Future: Send + 'static,
{
    type Response = PipelineResult;
    type Error = ServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<PipelineResult, ServiceError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: PipelineRequest) -> Self::Future {
        let span = info_span!(
            "pipeline_request",
            bound = request.bound,
            delay_secs = request.delay_secs,
            term_count = request.term_count,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(e) => e.kind(),
                };

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                metrics::histogram!(DURATION_HISTOGRAM).record(elapsed.as_secs_f64());
                metrics::counter!(OUTCOME_COUNTER, "outcome" => outcome).increment(1);

                tracing::info!(duration_ms, outcome, "pipeline request complete");

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
