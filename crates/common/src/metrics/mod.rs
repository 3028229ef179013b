//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all cinema metrics
pub const METRICS_PREFIX: &str = "cinema";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Visitor feedback
    describe_counter!(
        format!("{}_ratings_submitted_total", METRICS_PREFIX),
        Unit::Count,
        "Total star ratings stored (first votes and overwrites)"
    );

    describe_counter!(
        format!("{}_reviews_submitted_total", METRICS_PREFIX),
        Unit::Count,
        "Total reviews stored, by root or reply"
    );

    // Catalog
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of title searches"
    );

    // Back-office
    describe_counter!(
        format!("{}_admin_actions_total", METRICS_PREFIX),
        Unit::Count,
        "Total back-office changes, by action"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a stored rating
pub fn record_rating() {
    counter!(format!("{}_ratings_submitted_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a stored review
pub fn record_review(is_reply: bool) {
    let kind = if is_reply { "reply" } else { "root" };

    counter!(
        format!("{}_reviews_submitted_total", METRICS_PREFIX),
        "kind" => kind
    )
    .increment(1);
}

/// Helper to record search metrics
pub fn record_search() {
    counter!(format!("{}_search_queries_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record back-office changes
pub fn record_admin_action(action: &str) {
    counter!(
        format!("{}_admin_actions_total", METRICS_PREFIX),
        "action" => action.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed; calls must be no-ops
        let metrics = RequestMetrics::start("GET", "/movies");
        metrics.finish(200);
        record_rating();
        record_review(true);
        record_search();
        record_admin_action("publish");
    }
}
