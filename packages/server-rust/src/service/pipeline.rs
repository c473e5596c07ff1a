//! Pipeline orchestrator: prime search, then delay, then parallel aggregation.
//!
//! One top-level span covers the run and every stage gets a child span that
//! is closed on success and failure alike. The first stage error aborts the
//! run; later stages are never started.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use heavylift_core::{
    counter_names, span_names, Counters, PipelineError, PipelineFailure, PipelineRequest,
    PipelineResult, PipelineState, SpanContext, SpanGuard, Stage, Tracer,
};
use tower::Service;
use tracing::{debug, info, Instrument};

use super::aggregator::ParallelAggregator;
use super::config::PipelineConfig;
use super::delay::DelayStage;
use super::error::ServiceError;
use super::prime::PrimeFinder;

/// Sequences the three stages and reports their combined result.
///
/// Tracing and counters are injected so the orchestrator runs without a live
/// observability backend.
pub struct PipelineOrchestrator {
    prime: PrimeFinder,
    delay: DelayStage,
    aggregator: ParallelAggregator,
    tracer: Arc<dyn Tracer>,
    counters: Arc<dyn Counters>,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(
        config: &PipelineConfig,
        tracer: Arc<dyn Tracer>,
        counters: Arc<dyn Counters>,
    ) -> Self {
        Self {
            prime: PrimeFinder::new(config.sieve_capacity),
            delay: DelayStage::new(config.max_delay_secs),
            aggregator: ParallelAggregator::new(
                config.max_concurrent_terms,
                config.aggregate_deadline,
            ),
            tracer,
            counters,
        }
    }

    /// Swaps in a custom aggregator.
    #[must_use]
    pub fn with_aggregator(mut self, aggregator: ParallelAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    #[must_use]
    pub fn aggregator(&self) -> &ParallelAggregator {
        &self.aggregator
    }

    /// Runs the full pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure, tagged with the stage that produced it.
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineResult, PipelineFailure> {
        self.counters.increment(counter_names::PIPELINE);
        let mut root = SpanGuard::start(self.tracer.as_ref(), span_names::PIPELINE, None);
        let root_ctx = root.context().clone();

        let mut state = PipelineState::Idle;
        let outcome = self
            .run_stages(&mut state, &root_ctx, request)
            .instrument(root.tracing_span())
            .await;

        match &outcome {
            Ok(result) => info!(
                trace_id = %root_ctx.trace_id,
                largest_prime = result.largest_prime,
                delay_secs = result.delay_secs,
                approximation = result.approximation,
                "pipeline complete"
            ),
            Err(failure) => {
                root.record_error(&failure.to_string());
                info!(trace_id = %root_ctx.trace_id, error = %failure, "pipeline aborted");
            }
        }
        debug!(state = %state, "pipeline finished");

        outcome
    }

    async fn run_stages(
        &self,
        state: &mut PipelineState,
        parent: &SpanContext,
        request: PipelineRequest,
    ) -> Result<PipelineResult, PipelineFailure> {
        let largest_prime = self
            .stage(state, parent, Stage::PrimeSearch, self.prime.find(request.bound))
            .await?;

        let delay_secs = self
            .stage(state, parent, Stage::Delaying, self.delay.delay(request.delay_secs))
            .await?;

        let approximation = self
            .stage(
                state,
                parent,
                Stage::Aggregating,
                self.aggregator.approximate(request.term_count),
            )
            .await?;

        *state = state.advance();

        Ok(PipelineResult {
            largest_prime,
            delay_secs,
            approximation,
        })
    }

    /// Enters `stage`, runs `work` under a child span, and records the outcome.
    async fn stage<T>(
        &self,
        state: &mut PipelineState,
        parent: &SpanContext,
        stage: Stage,
        work: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineFailure> {
        *state = state.advance();
        debug_assert_eq!(state.stage(), Some(stage));
        debug!(state = %state, "entering stage");

        self.counters.increment(counter_name(stage));
        let mut span = SpanGuard::start(self.tracer.as_ref(), span_name(stage), Some(parent));

        match work.instrument(span.tracing_span()).await {
            Ok(value) => Ok(value),
            Err(error) => {
                span.record_error(&error.to_string());
                *state = state.fail();
                Err(PipelineFailure::new(stage, error))
            }
        }
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("prime", &self.prime)
            .field("delay", &self.delay)
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}

fn span_name(stage: Stage) -> &'static str {
    match stage {
        Stage::PrimeSearch => span_names::PRIME_SEARCH,
        Stage::Delaying => span_names::DELAY,
        Stage::Aggregating => span_names::APPROXIMATE,
    }
}

fn counter_name(stage: Stage) -> &'static str {
    match stage {
        Stage::PrimeSearch => counter_names::PRIME_SEARCH,
        Stage::Delaying => counter_names::DELAY,
        Stage::Aggregating => counter_names::APPROXIMATE,
    }
}

/// Tower adapter over a shared orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorService(Arc<PipelineOrchestrator>);

impl OrchestratorService {
    #[must_use]
    pub fn new(orchestrator: Arc<PipelineOrchestrator>) -> Self {
        Self(orchestrator)
    }
}

impl Service<PipelineRequest> for OrchestratorService {
    type Response = PipelineResult;
    type Error = ServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<PipelineResult, ServiceError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: PipelineRequest) -> Self::Future {
        let orchestrator = Arc::clone(&self.0);
        Box::pin(async move { orchestrator.run(request).await.map_err(ServiceError::from) })
    }
}
