//! Load-shedding middleware for pipeline requests.
//!
//! Every pipeline allocates its own sieve table, so the number of pipelines
//! running at once is capped. Requests beyond the cap fail immediately with
//! `ServiceError::Overloaded` instead of queueing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use heavylift_core::{PipelineRequest, PipelineResult};
use tokio::sync::Semaphore;
use tower::{Layer, Service};

use crate::service::error::ServiceError;

// ---------------------------------------------------------------------------
// LoadShedLayer
// ---------------------------------------------------------------------------

/// Tower layer that limits concurrent pipelines via a semaphore.
#[derive(Debug, Clone)]
pub struct LoadShedLayer {
    semaphore: Arc<Semaphore>,
}

impl LoadShedLayer {
    /// Create a new `LoadShedLayer` allowing `max_concurrent` pipelines at once.
    #[must_use]
    pub fn new(max_concurrent: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
        }
    }

    /// Permits currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl<S> Layer<S> for LoadShedLayer {
    type Service = LoadShedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoadShedService {
            inner,
            semaphore: Arc::clone(&self.semaphore),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadShedService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadShedService<S> {
    inner: S,
    semaphore: Arc<Semaphore>,
}

impl<S> Service<PipelineRequest> for LoadShedService<S>
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
        let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
            tracing::warn!(
                bound = request.bound,
                "pipeline limit reached, shedding request"
            );
            return Box::pin(async { Err(ServiceError::Overloaded) });
        };

        let fut = self.inner.call(request);
        Box::pin(async move {
            let result = fut.await;
            drop(permit);
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
