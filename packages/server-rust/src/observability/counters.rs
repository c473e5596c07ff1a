//! `Counters` implementations and the Prometheus recorder.

use heavylift_core::{counter_names, Counters};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::service::middleware::metrics::{DURATION_HISTOGRAM, OUTCOME_COUNTER};

/// Increments counters on the process-wide `metrics` recorder.
///
/// Without an installed recorder every increment is dropped silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCounters;

impl MetricsCounters {
    /// Registers help text for every pipeline metric.
    pub fn describe() {
        metrics::describe_counter!(
            counter_names::PIPELINE,
            "The total number of pipeline runs"
        );
        metrics::describe_counter!(
            counter_names::PRIME_SEARCH,
            "The total number of prime search stage runs"
        );
        metrics::describe_counter!(
            counter_names::DELAY,
            "The total number of delay stage runs"
        );
        metrics::describe_counter!(
            counter_names::APPROXIMATE,
            "The total number of approximation stage runs"
        );
        metrics::describe_counter!(OUTCOME_COUNTER, "Pipeline requests by outcome");
        metrics::describe_histogram!(
            DURATION_HISTOGRAM,
            metrics::Unit::Seconds,
            "Wall-clock duration of admitted pipeline requests"
        );
    }
}

impl Counters for MetricsCounters {
    fn increment(&self, name: &'static str) {
        metrics::counter!(name).increment(1);
    }
}

/// Discards every increment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCounters;

impl Counters for NoopCounters {
    fn increment(&self, _name: &'static str) {}
}

/// Installs the Prometheus recorder as the global `metrics` recorder.
///
/// The returned handle renders the exposition text for `GET /metrics`.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;
    MetricsCounters::describe();
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use metrics_exporter_prometheus::PrometheusBuilder;

    use super::*;

    #[test]
    fn metrics_counters_reach_the_local_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            MetricsCounters.increment(counter_names::PIPELINE);
            MetricsCounters.increment(counter_names::PIPELINE);
            MetricsCounters.increment(counter_names::DELAY);
        });

        let rendered = handle.render();
        assert!(rendered.contains("heavylift_pipeline_calls 2"), "{rendered}");
        assert!(rendered.contains("heavylift_delay_calls 1"), "{rendered}");
    }

    #[test]
    fn increments_without_recorder_are_ignored() {
        MetricsCounters.increment(counter_names::APPROXIMATE);
        NoopCounters.increment(counter_names::APPROXIMATE);
    }

    #[test]
    fn describe_emits_one_help_line_per_counter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            MetricsCounters::describe();
            MetricsCounters.increment(counter_names::PIPELINE);
        });

        let rendered = handle.render();
        assert_eq!(
            rendered.matches("# HELP heavylift_pipeline_calls").count(),
            1,
            "{rendered}"
        );
    }
}
