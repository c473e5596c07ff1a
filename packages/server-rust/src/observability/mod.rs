//! Concrete observability sinks for the pipeline's `Tracer` and `Counters` seams,
//! plus process-wide logging and metrics setup.

pub mod counters;
pub mod logging;
pub mod recording;
pub mod tracer;

pub use counters::{install_prometheus_recorder, MetricsCounters, NoopCounters};
pub use logging::{init_logging, LogFormat};
pub use recording::{RecordingCounters, RecordingTracer, SpanRecord};
pub use tracer::{NoopTracer, TracingTracer};
