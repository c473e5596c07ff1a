//! `Tracer` implementations backed by the `tracing` crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use heavylift_core::{ActiveSpan, SpanContext, Tracer};
use tracing::{debug, info_span, warn, Span};

/// Emits one `tracing` span per pipeline span.
///
/// Causality is carried in the `trace_id`, `span_id` and `parent_span_id`
/// fields so log pipelines can rebuild the tree. A new trace id (UUID v4) is
/// minted for every root span.
#[derive(Debug)]
pub struct TracingTracer {
    service_name: String,
    next_span_id: AtomicU64,
}

impl TracingTracer {
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            next_span_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Tracer for TracingTracer {
    fn start_span(&self, name: &'static str, parent: Option<&SpanContext>) -> Box<dyn ActiveSpan> {
        let span_id = self.next_span_id.fetch_add(1, Ordering::Relaxed);
        let context = match parent {
            Some(parent) => parent.child(span_id),
            None => SpanContext::root(uuid::Uuid::new_v4().to_string(), span_id),
        };

        let span = info_span!(
            "span",
            service = %self.service_name,
            span_name = name,
            trace_id = %context.trace_id,
            span_id = context.span_id,
            parent_span_id = context.parent_span_id,
            elapsed_ms = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        span.in_scope(|| debug!("span started"));

        Box::new(TracingSpan {
            span,
            context,
            started: Instant::now(),
        })
    }
}

struct TracingSpan {
    span: Span,
    context: SpanContext,
    started: Instant,
}

impl ActiveSpan for TracingSpan {
    fn context(&self) -> &SpanContext {
        &self.context
    }

    fn record_error(&mut self, message: &str) {
        self.span.record("error", message);
        self.span.in_scope(|| warn!(error = message, "span failed"));
    }

    fn tracing_span(&self) -> Span {
        self.span.clone()
    }

    fn finish(self: Box<Self>) {
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        self.span.record("elapsed_ms", elapsed_ms);
        self.span.in_scope(|| debug!(elapsed_ms, "span finished"));
    }
}

/// Tracer that opens nothing. Span contexts are still issued so callers can
/// nest children.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn start_span(&self, _name: &'static str, parent: Option<&SpanContext>) -> Box<dyn ActiveSpan> {
        let context = match parent {
            Some(parent) => parent.child(0),
            None => SpanContext::root(String::new(), 0),
        };
        Box::new(NoopSpan { context })
    }
}

struct NoopSpan {
    context: SpanContext,
}

impl ActiveSpan for NoopSpan {
    fn context(&self) -> &SpanContext {
        &self.context
    }

    fn finish(self: Box<Self>) {}
}

/// Id of the `tracing` parent of `span`, looked up in the current registry.
#[cfg(test)]
pub(crate) fn parent_of(span: &Span) -> Option<tracing::Id> {
    use tracing_subscriber::registry::LookupSpan;

    let id = span.id()?;
    tracing::dispatcher::get_default(|dispatch| {
        let registry = dispatch.downcast_ref::<tracing_subscriber::Registry>()?;
        registry.span(&id)?.parent().map(|parent| parent.id())
    })
}
