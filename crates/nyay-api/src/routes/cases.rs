//! # Case Operations API
//!
//! Case records and their stage lifecycle:
//!
//! | Method  | Path                                  | Role   |
//! |---------|---------------------------------------|--------|
//! | `POST`  | `/api/cases`                          | any    |
//! | `GET`   | `/api/cases`                          | any    |
//! | `GET`   | `/api/cases/{id}`                     | any    |
//! | `POST`  | `/api/cases/{id}/accept`              | lawyer |
//! | `PATCH` | `/api/cases/{id}/stage`               | lawyer |
//! | `POST`  | `/api/cases/{id}/stage/advance`       | lawyer |
//! | `POST`  | `/api/cases/{id}/stage/retreat`       | lawyer |
//! | `POST`  | `/api/cases/{id}/timeline`            | lawyer |
//! | `GET`   | `/api/cases/{id}/progress?view=`      | any    |
//!
//! Stage-changing endpoints take an optional `expected_version` and answer
//! with `{case, changed}`; `changed = false` marks a no-op.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nyay_core::{CaseId, UserId, ValidationError};
use nyay_state::{
    progress, CaseStage, Direction, ProgressView, StageProgress, TimelineEntry, TimelineStatus,
};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{
    extract_optional_json, extract_path, extract_query, extract_validated_json, Validate,
};
use crate::orchestration::{self, StageMove};
use crate::state::{AppState, CaseRecord};

// -- Request / response DTOs --------------------------------------------------

/// Request to post a case.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCaseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub posted_by: String,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub client_id: Option<UserId>,
    /// Initial stage. Defaults to `New Lead`.
    pub stage: Option<String>,
}

impl Validate for CreateCaseRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title").to_string());
        }
        if self.title.chars().count() > 200 {
            return Err("title must not exceed 200 characters".to_string());
        }
        if let Some(stage) = &self.stage {
            stage.parse::<CaseStage>().map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Explicit stage write.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStageRequest {
    /// Target stage; must be one of the six stage names.
    pub stage: String,
    /// Version the caller last read. Mismatch fails with `STALE_VERSION`.
    pub expected_version: Option<u64>,
}

impl Validate for SetStageRequest {
    fn validate(&self) -> Result<(), String> {
        self.stage
            .parse::<CaseStage>()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Body of advance / retreat. May be omitted entirely.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StepRequest {
    pub expected_version: Option<u64>,
}

/// Body of accept. May be omitted entirely.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AcceptRequest {
    /// Lawyer handle to record. Defaults to the caller's identity.
    pub accepted_by: Option<String>,
    pub expected_version: Option<u64>,
}

/// Timeline entry to append.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TimelineRequest {
    pub title: String,
    /// `completed` (default), `pending`, or `upcoming`.
    pub status: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Validate for TimelineRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title").to_string());
        }
        if let Some(status) = &self.status {
            status
                .parse::<TimelineStatus>()
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Result of a stage-changing request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageMoveResponse {
    pub case: CaseRecord,
    /// `false` when the request was a no-op.
    pub changed: bool,
}

/// List filters.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListCasesQuery {
    /// Only cases posted by this handle.
    pub posted_by: Option<String>,
    /// `true`: only unaccepted cases. `false`: only accepted ones.
    pub open: Option<bool>,
    /// Only cases at this stage.
    pub stage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressQuery {
    pub view: Option<String>,
}

/// Classified progress strip for one case.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProgressResponse {
    #[schema(value_type = String, format = Uuid)]
    pub case_id: CaseId,
    pub version: u64,
    #[schema(value_type = Object)]
    pub progress: StageProgress,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cases", get(list_cases).post(create_case))
        .route("/api/cases/{id}", get(get_case))
        .route("/api/cases/{id}/accept", post(accept_case))
        .route("/api/cases/{id}/stage", patch(set_stage))
        .route("/api/cases/{id}/stage/advance", post(advance_stage))
        .route("/api/cases/{id}/stage/retreat", post(retreat_stage))
        .route("/api/cases/{id}/timeline", post(add_timeline_entry))
        .route("/api/cases/{id}/progress", get(case_progress))
}

// -- Handlers -----------------------------------------------------------------

/// POST /api/cases: post a new case.
#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created", body = CaseRecord),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn create_case(
    State(state): State<AppState>,
    body: Result<Json<CreateCaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CaseRecord>), AppError> {
    let req = extract_validated_json(body)?;

    let mut record = CaseRecord::new(req.title.trim());
    record.description = req.description;
    if let Some(category) = req.category.filter(|c| !c.trim().is_empty()) {
        record.category = category;
    }
    record.location = req.location;
    record.budget = req.budget;
    record.posted_by = req.posted_by;
    record.client_id = req.client_id;
    if let Some(stage) = req.stage {
        record.stage = stage.parse::<CaseStage>()?;
    }

    let record = orchestration::create_case(&state, record).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/cases: list cases, newest first.
#[utoipa::path(
    get,
    path = "/api/cases",
    params(
        ("posted_by" = Option<String>, Query, description = "Poster handle"),
        ("open" = Option<bool>, Query, description = "Only unaccepted (true) or accepted (false) cases"),
        ("stage" = Option<String>, Query, description = "Stage name"),
    ),
    responses(
        (status = 200, description = "Matching cases", body = Vec<CaseRecord>),
        (status = 422, description = "Unknown stage", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn list_cases(
    State(state): State<AppState>,
    query: Result<Query<ListCasesQuery>, QueryRejection>,
) -> Result<Json<Vec<CaseRecord>>, AppError> {
    let query = extract_query(query)?;
    let stage = query
        .stage
        .as_deref()
        .map(str::parse::<CaseStage>)
        .transpose()?;

    let mut cases: Vec<CaseRecord> = state
        .cases
        .list()
        .into_iter()
        .filter(|c| query.posted_by.as_deref().map_or(true, |p| c.posted_by == p))
        .filter(|c| query.open.map_or(true, |open| c.is_open() == open))
        .filter(|c| stage.map_or(true, |s| c.stage == s))
        .collect();
    cases.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(cases))
}

/// GET /api/cases/{id}: fetch one case.
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = Uuid, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case found", body = CaseRecord),
        (status = 400, description = "Malformed case ID", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn get_case(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CaseRecord>, AppError> {
    let id = extract_path(id)?;
    state
        .cases
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("case {id} not found")))
}

/// POST /api/cases/{id}/accept: a lawyer takes an open case.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/accept",
    params(("id" = Uuid, Path, description = "Case ID")),
    request_body = AcceptRequest,
    responses(
        (status = 200, description = "Case accepted", body = StageMoveResponse),
        (status = 403, description = "Caller is not a lawyer", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already accepted or stale version", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn accept_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<Json<StageMoveResponse>, AppError> {
    let id = extract_path(id)?;
    let req: AcceptRequest = extract_optional_json(&body)?;
    let (case, change) = orchestration::accept_case(
        &state,
        &caller,
        CaseId::from(id),
        req.accepted_by,
        req.expected_version,
    )
    .await?;
    Ok(Json(StageMoveResponse {
        case,
        changed: change.changed,
    }))
}

/// PATCH /api/cases/{id}/stage: write an explicit stage.
///
/// The target must be one of the six stages (else 422) and, under the
/// `adjacent` policy, at most one step from the current stage (else 409
/// `CONFLICT`). Writing the current stage is a no-op.
#[utoipa::path(
    patch,
    path = "/api/cases/{id}/stage",
    params(("id" = Uuid, Path, description = "Case ID")),
    request_body = SetStageRequest,
    responses(
        (status = 200, description = "Stage written or unchanged", body = StageMoveResponse),
        (status = 403, description = "Caller may not move this case", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Skipped stages or stale version", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown stage", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn set_stage(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SetStageRequest>, JsonRejection>,
) -> Result<Json<StageMoveResponse>, AppError> {
    let id = extract_path(id)?;
    let req = extract_validated_json(body)?;
    let target: CaseStage = req.stage.parse()?;
    move_and_respond(&state, &caller, id, StageMove::To(target), req.expected_version).await
}

/// POST /api/cases/{id}/stage/advance: one step toward `Closed`.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/stage/advance",
    params(("id" = Uuid, Path, description = "Case ID")),
    request_body = StepRequest,
    responses(
        (status = 200, description = "Advanced, or unchanged at Closed", body = StageMoveResponse),
        (status = 409, description = "Stale version", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn advance_stage(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<Json<StageMoveResponse>, AppError> {
    let id = extract_path(id)?;
    let req: StepRequest = extract_optional_json(&body)?;
    let requested = StageMove::Step(Direction::Forward);
    move_and_respond(&state, &caller, id, requested, req.expected_version).await
}

/// POST /api/cases/{id}/stage/retreat: one step toward `New Lead`.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/stage/retreat",
    params(("id" = Uuid, Path, description = "Case ID")),
    request_body = StepRequest,
    responses(
        (status = 200, description = "Retreated, or unchanged at New Lead", body = StageMoveResponse),
        (status = 409, description = "Stale version", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn retreat_stage(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<Json<StageMoveResponse>, AppError> {
    let id = extract_path(id)?;
    let req: StepRequest = extract_optional_json(&body)?;
    let requested = StageMove::Step(Direction::Backward);
    move_and_respond(&state, &caller, id, requested, req.expected_version).await
}

async fn move_and_respond(
    state: &AppState,
    caller: &CallerIdentity,
    id: Uuid,
    requested: StageMove,
    expected_version: Option<u64>,
) -> Result<Json<StageMoveResponse>, AppError> {
    let (case, change) =
        orchestration::move_stage(state, caller, CaseId::from(id), requested, expected_version)
            .await?;
    Ok(Json(StageMoveResponse {
        case,
        changed: change.changed,
    }))
}

/// POST /api/cases/{id}/timeline: append a timeline entry.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/timeline",
    params(("id" = Uuid, Path, description = "Case ID")),
    request_body = TimelineRequest,
    responses(
        (status = 201, description = "Entry appended", body = CaseRecord),
        (status = 403, description = "Caller may not post to this case", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid entry", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn add_timeline_entry(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<TimelineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CaseRecord>), AppError> {
    let id = extract_path(id)?;
    let req = extract_validated_json(body)?;
    let status: TimelineStatus = match req.status {
        Some(s) => s.parse()?,
        None => Default::default(),
    };
    let entry = TimelineEntry::new(req.title.trim(), status, req.description)?;
    let case = orchestration::append_timeline(&state, &caller, CaseId::from(id), entry).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

/// GET /api/cases/{id}/progress: classified progress strip.
#[utoipa::path(
    get,
    path = "/api/cases/{id}/progress",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("view" = Option<String>, Query, description = "board (default), timeline, or trust"),
    ),
    responses(
        (status = 200, description = "Progress strip", body = ProgressResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown view", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn case_progress(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> Result<Json<ProgressResponse>, AppError> {
    let id = extract_path(id)?;
    let query = extract_query(query)?;
    let view: ProgressView = match query.view.as_deref() {
        Some(v) => v.parse()?,
        None => ProgressView::default(),
    };
    let case = state
        .cases
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("case {id} not found")))?;
    Ok(Json(ProgressResponse {
        case_id: case.id,
        version: case.version,
        progress: progress(view, case.stage),
    }))
}
