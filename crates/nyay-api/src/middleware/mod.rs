//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`tracing_layer`]: request/response tracing with `TraceLayer`.
//! - [`metrics`]: request counters and latency histograms.
//! - [`rate_limit`]: per-caller rate limiting.

pub mod metrics;
pub mod rate_limit;
pub mod tracing_layer;
