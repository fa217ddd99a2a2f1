//! # nyay-cli: Command-Line Client for NyayNow Cases
//!
//! Thin client over the case API. Stage arithmetic (neighbors, parsing,
//! progress classification) comes from `nyay-state`, so the CLI refuses an
//! advance at `Closed` without a round trip and renders the same progress
//! strips the server computes.
//!
//! Every stage write carries the version read just before it; if someone
//! else moved the case in between, the server answers `STALE_VERSION`.

pub mod client;
pub mod commands;
pub mod render;
