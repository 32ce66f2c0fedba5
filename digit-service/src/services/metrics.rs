//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter, provides the /metrics endpoint output and
//! the prediction-specific recorders.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Initialize the metrics recorder.
///
/// Only the first call installs a recorder; later calls are no-ops.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    let installed = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .and_then(|builder| builder.install_recorder());

    match installed {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
    }
}

/// Get the current metrics in Prometheus text format.
///
/// Returns a string suitable for the /metrics HTTP endpoint.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_prediction(digit: u8, classifier: &str) {
    counter!(
        "digit_predictions_total",
        "digit" => digit.to_string(),
        "classifier" => classifier.to_string()
    )
    .increment(1);
}

pub fn record_failure(stage: &'static str) {
    counter!("digit_prediction_failures_total", "stage" => stage).increment(1);
}

pub fn record_preprocess_duration(elapsed: Duration) {
    histogram!("digit_preprocess_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_inference_duration(elapsed: Duration) {
    histogram!("digit_inference_duration_seconds").record(elapsed.as_secs_f64());
}
