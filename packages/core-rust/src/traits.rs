use crate::context::SpanContext;

/// Metric counter names incremented by the pipeline.
pub mod counter_names {
    pub const PIPELINE: &str = "heavylift_pipeline_calls";
    pub const PRIME_SEARCH: &str = "heavylift_prime_search_calls";
    pub const DELAY: &str = "heavylift_delay_calls";
    pub const APPROXIMATE: &str = "heavylift_approximate_calls";
}

/// Span names opened by the pipeline.
pub mod span_names {
    pub const PIPELINE: &str = "pipeline";
    pub const PRIME_SEARCH: &str = "prime_search";
    pub const DELAY: &str = "delay";
    pub const APPROXIMATE: &str = "approximate";
}

/// Source of traced units of work.
/// Injected into the orchestrator so tracing backends can be swapped or absent in tests.
pub trait Tracer: Send + Sync {
    /// Opens a span, nested under `parent` when given.
    fn start_span(&self, name: &'static str, parent: Option<&SpanContext>) -> Box<dyn ActiveSpan>;
}

/// An open span. Closed exactly once via [`ActiveSpan::finish`].
pub trait ActiveSpan: Send {
    /// Causal identity of this span, used to open children.
    fn context(&self) -> &SpanContext;

    /// Attaches an error description. Default is a no-op.
    fn record_error(&mut self, _message: &str) {}

    /// `tracing` span to enter while the work runs. Default is a disabled span.
    fn tracing_span(&self) -> tracing::Span {
        tracing::Span::none()
    }

    /// Closes the span.
    fn finish(self: Box<Self>);
}

/// Monotonic counters keyed by name. Fire-and-forget: implementations must not panic.
pub trait Counters: Send + Sync {
    fn increment(&self, name: &'static str);
}

/// Closes the wrapped span when dropped, so every exit path finishes it.
pub struct SpanGuard {
    span: Option<Box<dyn ActiveSpan>>,
}

impl SpanGuard {
    /// Opens `name` on `tracer` and guards it.
    #[must_use]
    pub fn start(tracer: &dyn Tracer, name: &'static str, parent: Option<&SpanContext>) -> Self {
        Self {
            span: Some(tracer.start_span(name, parent)),
        }
    }

    /// Causal identity of the guarded span.
    ///
    /// # Panics
    ///
    /// Never in practice: the span is only taken in `Drop`.
    #[must_use]
    pub fn context(&self) -> &SpanContext {
        self.span
            .as_ref()
            .map(|span| span.context())
            .expect("span is present until drop")
    }

    pub fn record_error(&mut self, message: &str) {
        if let Some(span) = self.span.as_mut() {
            span.record_error(message);
        }
    }

    /// `tracing` span of the guarded span, for entering or instrumenting work.
    #[must_use]
    pub fn tracing_span(&self) -> tracing::Span {
        self.span
            .as_ref()
            .map_or_else(tracing::Span::none, |span| span.tracing_span())
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let Some(span) = self.span.take() {
            span.finish();
        }
    }
}

impl std::fmt::Debug for SpanGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanGuard")
            .field("context", &self.span.as_ref().map(|span| span.context()))
            .finish()
    }
}
