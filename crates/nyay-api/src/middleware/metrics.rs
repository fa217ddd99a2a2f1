//! # Prometheus Metrics
//!
//! Recorded through the `metrics` facade and exported by
//! `metrics-exporter-prometheus`. When no recorder is installed (tests,
//! `NYAY_METRICS_ENABLED=false`) every macro is a no-op.
//!
//! HTTP metrics are pushed from middleware. The per-stage case gauge is
//! refreshed on each `/metrics` scrape (pull model).

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use nyay_state::{CaseStage, StageChange};

pub const HTTP_REQUESTS_TOTAL: &str = "nyay_http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "nyay_http_request_duration_seconds";
pub const STAGE_TRANSITIONS_TOTAL: &str = "nyay_stage_transitions_total";
pub const CASES_BY_STAGE: &str = "nyay_cases_by_stage";

/// Install the global Prometheus recorder.
///
/// Call once per process; a second call fails with [`BuildError`].
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Middleware that counts requests and records their latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method,
        "path" => path
    )
    .record(started.elapsed().as_secs_f64());

    response
}

/// Count an effective stage move. No-ops are not recorded.
pub fn record_stage_change(change: &StageChange) {
    if change.changed {
        counter!(
            STAGE_TRANSITIONS_TOTAL,
            "from" => change.from.as_str(),
            "to" => change.to.as_str()
        )
        .increment(1);
    }
}

/// Publish the number of cases at each stage.
pub fn publish_stage_counts(counts: &[(CaseStage, usize)]) {
    for (stage, count) in counts {
        gauge!(CASES_BY_STAGE, "stage" => stage.as_str()).set(*count as f64);
    }
}
