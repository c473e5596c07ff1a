//! In-memory sinks that record what the pipeline emitted.
//!
//! Used by tests to assert span nesting and counter values without a
//! tracing backend or metrics recorder.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use heavylift_core::{ActiveSpan, Counters, SpanContext, Tracer};
use parking_lot::Mutex;

/// Snapshot of one recorded span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    pub name: &'static str,
    pub context: SpanContext,
    pub finished: bool,
    pub error: Option<String>,
}

/// Tracer that keeps every span in start order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    next_id: AtomicU64,
    next_trace: AtomicU64,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All spans started so far, in start order.
    #[must_use]
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().clone()
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, name: &'static str, parent: Option<&SpanContext>) -> Box<dyn ActiveSpan> {
        let span_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let context = match parent {
            Some(parent) => parent.child(span_id),
            None => {
                let trace = self.next_trace.fetch_add(1, Ordering::Relaxed) + 1;
                SpanContext::root(format!("trace-{trace}"), span_id)
            }
        };

        let mut spans = self.spans.lock();
        let index = spans.len();
        spans.push(SpanRecord {
            name,
            context: context.clone(),
            finished: false,
            error: None,
        });

        Box::new(RecordingSpan {
            index,
            context,
            spans: Arc::clone(&self.spans),
        })
    }
}

struct RecordingSpan {
    index: usize,
    context: SpanContext,
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl ActiveSpan for RecordingSpan {
    fn context(&self) -> &SpanContext {
        &self.context
    }

    fn record_error(&mut self, message: &str) {
        if let Some(record) = self.spans.lock().get_mut(self.index) {
            record.error = Some(message.to_string());
        }
    }

    fn finish(self: Box<Self>) {
        if let Some(record) = self.spans.lock().get_mut(self.index) {
            record.finished = true;
        }
    }
}

/// Counters kept in a map, readable by name.
#[derive(Debug, Default)]
pub struct RecordingCounters {
    counts: Mutex<HashMap<&'static str, u64>>,
}

impl RecordingCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `name`; zero if never incremented.
    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.counts.lock().get(name).copied().unwrap_or(0)
    }
}

impl Counters for RecordingCounters {
    fn increment(&self, name: &'static str) {
        *self.counts.lock().entry(name).or_insert(0) += 1;
    }
}
