/// Causal identity of one traced unit of work.
/// Passed explicitly from the pipeline span into each stage span so children link to their parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    /// Identifier shared by every span of one pipeline run.
    pub trace_id: String,
    /// Identifier of this span, unique within the tracer that issued it.
    pub span_id: u64,
    /// Span this one was opened under. `None` for the top-level span.
    pub parent_span_id: Option<u64>,
}

impl SpanContext {
    /// Context for a top-level span starting a new trace.
    #[must_use]
    pub fn root(trace_id: impl Into<String>, span_id: u64) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id,
            parent_span_id: None,
        }
    }

    /// Context for a span nested under `self`, sharing its trace id.
    #[must_use]
    pub fn child(&self, span_id: u64) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id,
            parent_span_id: Some(self.span_id),
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_links_to_parent() {
        let root = SpanContext::root("trace-1", 1);
        let child = root.child(2);
        assert!(root.is_root());
        assert!(!child.is_root());
        assert_eq!(child.trace_id, "trace-1");
        assert_eq!(child.parent_span_id, Some(1));
        assert_eq!(child.span_id, 2);
    }
}
