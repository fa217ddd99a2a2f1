//! # nyay-api: Axum API Service for NyayNow Cases
//!
//! Serves case records and their six-stage lifecycle. Every stage move is
//! checked by `nyay-state`, carries an optimistic version token, and is
//! written through to Postgres when a database is configured.
//!
//! ## API Surface
//!
//! | Prefix            | Module                 | Domain                  |
//! |-------------------|------------------------|-------------------------|
//! | `/api/stages`     | [`routes::stages`]     | Stage contract          |
//! | `/api/cases/*`    | [`routes::cases`]      | Cases and stage moves   |
//! | `/api/board`      | [`routes::board`]      | Lawyer Kanban board     |
//! | `/api/insights`   | [`routes::insights`]   | Workload, case health   |
//! | `/openapi.json`   | [`openapi`]            | Generated OpenAPI spec  |
//! | `/health/*`       | here                   | Probes (no auth)        |
//! | `/metrics`        | here                   | Prometheus (no auth)    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod orchestration;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthConfig;
use crate::error::AppError;
use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the auth middleware so
/// that orchestrators and scrapers need no credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let limiter = RateLimiter::new(state.config.rate_limit.clone());
    let body_limit = state.config.body_limit_bytes;

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::stages::router())
        .merge(routes::cases::router())
        .merge(routes::board::router())
        .merge(routes::insights::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(limiter))
        .layer(DefaultBodyLimit::max(body_limit));

    // Unauthenticated probes and scrape endpoint.
    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(ops)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the database (if any) answers.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if let Some(pool) = &state.db_pool {
        db::ping(pool).await.map_err(|e| {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            AppError::ServiceUnavailable("database unavailable".to_string())
        })?;
    }
    Ok("ready")
}

/// Prometheus text exposition. 503 when metrics are disabled.
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("metrics disabled".to_string()))?;
    middleware::metrics::publish_stage_counts(&state.stage_counts());
    Ok(handle.render())
}
