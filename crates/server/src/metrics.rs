//! Prometheus metrics
//!
//! The dispatcher records through the `metrics` facade; this module installs
//! the recorder and renders it at `/metrics`.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

const DISPATCH_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Install the global Prometheus recorder
///
/// Returns `None` (logged) when a recorder is already installed or the
/// exporter cannot be built.
pub fn init_metrics() -> Option<PrometheusHandle> {
    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("catalog_chat_dispatch_seconds".to_string()),
        DISPATCH_BUCKETS,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid histogram buckets, metrics disabled");
            return None;
        },
    };

    match builder.install_recorder() {
        Ok(handle) => {
            describe();
            Some(handle)
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        },
    }
}

fn describe() {
    metrics::describe_counter!(
        "catalog_chat_messages_total",
        "Inbound messages dispatched, by intent"
    );
    metrics::describe_counter!(
        "catalog_chat_catalog_misses_total",
        "Catalog-bound messages answered with not found"
    );
    metrics::describe_histogram!(
        "catalog_chat_dispatch_seconds",
        metrics::Unit::Seconds,
        "Time from routing to reply, by intent"
    );
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
