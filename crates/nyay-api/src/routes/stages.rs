//! # Stage Contract
//!
//! Publishes the ordered stage list and the active move policy so that
//! clients never hard-code either.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use nyay_state::CaseStage;

use crate::state::AppState;

/// The stage contract.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StagesResponse {
    /// Stage names in lifecycle order. Index 0 is the initial stage.
    pub stages: Vec<String>,
    /// Policy applied to explicit stage writes: `adjacent` or `any`.
    pub move_policy: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/stages", get(list_stages))
}

/// GET /api/stages: the ordered stage list.
#[utoipa::path(
    get,
    path = "/api/stages",
    responses(
        (status = 200, description = "Ordered stages", body = StagesResponse),
    ),
    tag = "stages"
)]
pub async fn list_stages(State(state): State<AppState>) -> Json<StagesResponse> {
    Json(StagesResponse {
        stages: CaseStage::ALL.iter().map(|s| s.as_str().to_string()).collect(),
        move_policy: state.config.stage_policy.as_str().to_string(),
    })
}
