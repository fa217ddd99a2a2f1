//! Lawyer Kanban board: six stage columns, always all six.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use nyay_core::UserId;
use nyay_state::{group_by_stage, CaseStage};

use crate::auth::{CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::{AppState, CaseRecord};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BoardQuery {
    /// Restrict to cases worked by this lawyer.
    pub lawyer_id: Option<String>,
}

/// One column of the board.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BoardColumnView {
    #[schema(value_type = String, example = "Filing")]
    pub stage: CaseStage,
    pub count: usize,
    pub cases: Vec<CaseRecord>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BoardResponse {
    /// Columns in lifecycle order.
    pub columns: Vec<BoardColumnView>,
    /// Cases not yet `Closed`.
    pub active_count: usize,
    pub total: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/board", get(board))
}

/// Cases worked by `lawyer_id` if given; otherwise a lawyer token carrying a
/// user id sees its own cases and every other caller sees all cases.
pub(crate) fn cases_in_scope(
    state: &AppState,
    caller: &CallerIdentity,
    lawyer_id: Option<&str>,
) -> Result<Vec<CaseRecord>, AppError> {
    let lawyer: Option<UserId> = match lawyer_id {
        Some(raw) => Some(raw.parse::<UserId>()?),
        None if caller.role == Role::Lawyer => caller.user_id,
        None => None,
    };
    Ok(state
        .cases
        .list()
        .into_iter()
        .filter(|c| lawyer.map_or(true, |id| c.lawyer_id == Some(id)))
        .collect())
}

/// GET /api/board: cases grouped by stage, scoped by [`cases_in_scope`].
#[utoipa::path(
    get,
    path = "/api/board",
    params(("lawyer_id" = Option<String>, Query, description = "Lawyer user ID")),
    responses(
        (status = 200, description = "Kanban board", body = BoardResponse),
        (status = 422, description = "Malformed lawyer ID", body = crate::error::ErrorBody),
    ),
    tag = "board"
)]
pub async fn board(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<BoardQuery>, QueryRejection>,
) -> Result<Json<BoardResponse>, AppError> {
    let query = extract_query(query)?;
    let mut cases = cases_in_scope(&state, &caller, query.lawyer_id.as_deref())?;
    cases.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));

    let total = cases.len();
    let active_count = cases.iter().filter(|c| !c.stage.is_terminal()).count();
    let columns = group_by_stage(cases, |c| c.stage)
        .into_iter()
        .map(|column| BoardColumnView {
            stage: column.stage,
            count: column.len(),
            cases: column.items,
        })
        .collect();

    Ok(Json(BoardResponse {
        columns,
        active_count,
        total,
    }))
}
