//! Lawyer insights: workload band and the cases most in need of attention.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use nyay_core::{CaseId, Timestamp};
use nyay_state::{insights, CaseActivity, CaseStage, HealthIssue, NextAction, WorkloadStatus};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::extract_query;
use crate::routes::board::cases_in_scope;
use crate::state::{AppState, CaseRecord};

/// Cases listed when `limit` is not given.
pub const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InsightsQuery {
    /// Restrict to cases worked by this lawyer.
    pub lawyer_id: Option<String>,
    /// Number of ranked cases to return (default 5, at most 100).
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkloadView {
    /// `Light`, `Balanced`, or `Overloaded`.
    #[schema(value_type = String, example = "Balanced")]
    pub status: WorkloadStatus,
    /// Cases not yet `Closed`.
    pub active_cases: usize,
}

/// One ranked case.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaseInsightView {
    #[schema(value_type = String, format = Uuid)]
    pub case_id: CaseId,
    pub title: String,
    #[schema(value_type = String, example = "Hearing")]
    pub stage: CaseStage,
    /// 0 to 100.
    pub health: u8,
    #[schema(value_type = Vec<String>)]
    pub health_issues: Vec<HealthIssue>,
    #[schema(value_type = String, example = "follow_up_with_client")]
    pub next_action: NextAction,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InsightsResponse {
    pub workload: WorkloadView,
    /// Lowest health first.
    pub cases: Vec<CaseInsightView>,
    /// Cases considered, before `limit`.
    pub total: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/insights", get(lawyer_insights))
}

fn activity(case: &CaseRecord) -> CaseActivity {
    CaseActivity {
        stage: case.stage,
        updated_at: Timestamp::from_utc(case.updated_at),
        timeline_len: case.timeline.len(),
    }
}

/// GET /api/insights: workload and worst-health cases.
///
/// Scoped the same way as the board.
#[utoipa::path(
    get,
    path = "/api/insights",
    params(
        ("lawyer_id" = Option<String>, Query, description = "Lawyer user ID"),
        ("limit" = Option<usize>, Query, description = "Ranked cases to return (default 5)"),
    ),
    responses(
        (status = 200, description = "Workload and ranked cases", body = InsightsResponse),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed lawyer ID or limit", body = crate::error::ErrorBody),
    ),
    tag = "board"
)]
pub async fn lawyer_insights(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<InsightsQuery>, QueryRejection>,
) -> Result<Json<InsightsResponse>, AppError> {
    let query = extract_query(query)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let mut cases = cases_in_scope(&state, &caller, query.lawyer_id.as_deref())?;
    cases.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    let total = cases.len();
    let report = insights(cases, activity, Timestamp::now());

    let ranked = report
        .cases
        .into_iter()
        .take(limit)
        .map(|ranked| CaseInsightView {
            case_id: ranked.item.id,
            title: ranked.item.title,
            stage: ranked.item.stage,
            health: ranked.health.score,
            health_issues: ranked.health.issues,
            next_action: ranked.health.next_action,
            last_update: ranked.item.updated_at,
        })
        .collect();

    Ok(Json(InsightsResponse {
        workload: WorkloadView {
            status: report.workload.status,
            active_cases: report.workload.active_cases,
        },
        cases: ranked,
        total,
    }))
}
