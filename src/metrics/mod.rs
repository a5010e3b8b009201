//! Metrics collection for observability

use crate::performance::Severity;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_with_registry, Counter, CounterVec, Histogram, Opts, Registry,
};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Context selection metrics
    pub context_selections: Counter,
    pub context_cache_lookups: CounterVec,
    pub context_tokens_selected: Histogram,
    pub context_budget_utilization: Histogram,
    pub context_source_failures: Counter,

    // Performance advisory metrics
    pub performance_samples: CounterVec,
    pub performance_advisories: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let context_selections = register_counter_with_registry!(
            Opts::new("context_selections_total", "Total context selections computed"),
            registry
        )?;

        let context_cache_lookups = register_counter_vec_with_registry!(
            Opts::new("context_cache_lookups_total", "Context cache lookups by result"),
            &["result"],
            registry
        )?;

        let context_tokens_selected = register_histogram_with_registry!(
            "context_tokens_selected",
            "Tokens selected per context bundle",
            registry
        )?;

        let context_budget_utilization = register_histogram_with_registry!(
            "context_budget_utilization_ratio",
            "Share of the available token budget used per bundle",
            vec![0.1, 0.25, 0.5, 0.75, 0.9, 1.0],
            registry
        )?;

        let context_source_failures = register_counter_with_registry!(
            Opts::new("context_source_failures_total", "Sources excluded after a failed fetch"),
            registry
        )?;

        let performance_samples = register_counter_vec_with_registry!(
            Opts::new("performance_samples_total", "Workflow duration samples by outcome"),
            &["status"],
            registry
        )?;

        let performance_advisories = register_counter_vec_with_registry!(
            Opts::new("performance_advisories_total", "Performance advisories by severity"),
            &["severity"],
            registry
        )?;

        Ok(Self {
            registry,
            context_selections,
            context_cache_lookups,
            context_tokens_selected,
            context_budget_utilization,
            context_source_failures,
            performance_samples,
            performance_advisories,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a context cache lookup
    pub fn record_cache_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.context_cache_lookups.with_label_values(&[result]).inc();
    }

    /// Record a freshly computed selection
    pub fn record_selection(&self, used: usize, available: usize) {
        self.context_selections.inc();
        self.context_tokens_selected.observe(used as f64);
        if available > 0 {
            self.context_budget_utilization
                .observe(used as f64 / available as f64);
        }
    }

    pub fn record_source_failures(&self, count: usize) {
        self.context_source_failures.inc_by(count as f64);
    }

    /// Record a duration sample
    pub fn record_sample(&self, accepted: bool) {
        let status = if accepted { "accepted" } else { "dropped" };
        self.performance_samples.with_label_values(&[status]).inc();
    }

    pub fn record_advisory(&self, severity: Severity) {
        self.performance_advisories
            .with_label_values(&[severity.as_str()])
            .inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
