//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Registers the bearer scheme used by every `/api/*` route.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("{role}:{user_id}:{secret} or {secret}"))
                    .build(),
            ),
        );
    }
}

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "NyayNow Case API",
        version = "0.1.0",
        description = "Case records and their six-stage lifecycle: posting, acceptance, stage moves, timeline, board and progress views."
    ),
    paths(
        crate::routes::stages::list_stages,
        crate::routes::cases::create_case,
        crate::routes::cases::list_cases,
        crate::routes::cases::get_case,
        crate::routes::cases::accept_case,
        crate::routes::cases::set_stage,
        crate::routes::cases::advance_stage,
        crate::routes::cases::retreat_stage,
        crate::routes::cases::add_timeline_entry,
        crate::routes::cases::case_progress,
        crate::routes::board::board,
        crate::routes::insights::lawyer_insights,
    ),
    components(schemas(
        crate::state::CaseRecord,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::stages::StagesResponse,
        crate::routes::cases::CreateCaseRequest,
        crate::routes::cases::SetStageRequest,
        crate::routes::cases::StepRequest,
        crate::routes::cases::AcceptRequest,
        crate::routes::cases::TimelineRequest,
        crate::routes::cases::StageMoveResponse,
        crate::routes::cases::ProgressResponse,
        crate::routes::board::BoardColumnView,
        crate::routes::board::BoardResponse,
        crate::routes::insights::WorkloadView,
        crate::routes::insights::CaseInsightView,
        crate::routes::insights::InsightsResponse,
    )),
    modifiers(&SecurityAddon),
    security(("bearer" = [])),
    tags(
        (name = "stages", description = "Stage contract"),
        (name = "cases", description = "Case records and stage moves"),
        (name = "board", description = "Lawyer Kanban board and insights"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
