//! # Integration Tests for nyay-api
//!
//! Drives the assembled router in-process: case posting, acceptance, stage
//! moves with version tokens, the move policy, progress views, the board,
//! authentication, health probes, and OpenAPI generation.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use nyay_api::config::AppConfig;
use nyay_api::state::{AppState, CaseRecord};
use nyay_state::{CaseStage, MovePolicy, TimelineEntry, TimelineStatus};

const SECRET: &str = "integration-secret";
const LAWYER_A: &str = "7f1c2a52-3f0e-4a7b-9d0c-2f6a1f0b5a11";
const LAWYER_B: &str = "0b9e8f0a-5c11-4d2e-8a3b-6c7d8e9f0a22";

/// Helper: build the test app with auth disabled.
fn test_app() -> axum::Router {
    nyay_api::app(AppState::new())
}

fn test_app_with_config(config: AppConfig) -> axum::Router {
    nyay_api::app(AppState::with_config(config, None))
}

fn test_app_with_auth() -> axum::Router {
    test_app_with_config(AppConfig {
        auth_token: Some(SECRET.to_string()),
        ..AppConfig::default()
    })
}

fn lawyer_token(user: &str) -> String {
    format!("Bearer lawyer:{user}:{SECRET}")
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> axum::http::Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Helper: post a case and return its id.
async fn post_case(app: &axum::Router, body: Value) -> String {
    let response = send(app, json_request("POST", "/api/cases", body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

async fn case_at(app: &axum::Router, stage: &str) -> String {
    post_case(app, json!({"title": "Tenancy dispute", "stage": stage})).await
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = send(&test_app(), get("/health/liveness")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe_without_database() {
    let response = send(&test_app(), get("/health/readiness")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_metrics_unavailable_without_recorder() {
    let response = send(&test_app(), get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

// -- Stage Contract -----------------------------------------------------------

#[tokio::test]
async fn test_stage_list_is_ordered() {
    let response = send(&test_app(), get("/api/stages")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["stages"],
        json!(["New Lead", "Discovery", "Filing", "Hearing", "Judgment", "Closed"])
    );
    assert_eq!(body["move_policy"], "adjacent");
}

// -- Case Posting -------------------------------------------------------------

#[tokio::test]
async fn test_new_case_starts_at_new_lead() {
    let app = test_app();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/cases",
            json!({"title": "Property boundary", "posted_by": "+919800000001"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["stage"], "New Lead");
    assert_eq!(body["version"], 1);
    assert_eq!(body["category"], "General");
    assert!(body["accepted_by"].is_null());
    assert_eq!(body["stage_history"], json!([]));
}

#[tokio::test]
async fn test_create_with_blank_title_is_422() {
    let response = send(
        &test_app(),
        json_request("POST", "/api/cases", json!({"title": "   "})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_with_unknown_stage_is_422() {
    let response = send(
        &test_app(),
        json_request("POST", "/api/cases", json!({"title": "x", "stage": "Appeal"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/cases")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&test_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_case_is_404() {
    let uri = format!("/api/cases/{}", uuid::Uuid::new_v4());
    let response = send(&test_app(), get(&uri)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_with_long_devanagari_title() {
    let app = test_app();
    let title = "न".repeat(200);
    let response = send(&app, json_request("POST", "/api/cases", json!({"title": title}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["title"], title.as_str());

    let too_long = "न".repeat(201);
    let response = send(
        &app,
        json_request("POST", "/api/cases", json!({"title": too_long})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_case_id_is_400_with_error_body() {
    let app = test_app();
    for request in [
        get("/api/cases/not-a-uuid"),
        get("/api/cases/not-a-uuid/progress"),
        json_request("POST", "/api/cases/not-a-uuid/stage/advance", json!({})),
        json_request("PATCH", "/api/cases/not-a-uuid/stage", json!({"stage": "Filing"})),
    ] {
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert!(body["error"]["message"].as_str().unwrap().contains("id"));
    }
}

#[tokio::test]
async fn test_malformed_query_is_400_with_error_body() {
    let response = send(&test_app(), get("/api/cases?open=maybe")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("open"));
}

#[tokio::test]
async fn test_list_filters_by_stage_and_poster() {
    let app = test_app();
    post_case(&app, json!({"title": "a", "posted_by": "alice"})).await;
    post_case(&app, json!({"title": "b", "posted_by": "bob", "stage": "Filing"})).await;
    post_case(&app, json!({"title": "c", "posted_by": "alice", "stage": "Filing"})).await;

    let all = body_json(send(&app, get("/api/cases")).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let filing = body_json(send(&app, get("/api/cases?stage=Filing")).await).await;
    assert_eq!(filing.as_array().unwrap().len(), 2);

    let alice_filing =
        body_json(send(&app, get("/api/cases?stage=Filing&posted_by=alice")).await).await;
    assert_eq!(alice_filing.as_array().unwrap().len(), 1);
    assert_eq!(alice_filing[0]["title"], "c");

    let response = send(&app, get("/api/cases?stage=Appeal")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_open_filter() {
    let app = test_app();
    let accepted = post_case(&app, json!({"title": "taken"})).await;
    post_case(&app, json!({"title": "waiting"})).await;
    let uri = format!("/api/cases/{accepted}/accept");
    assert_eq!(
        send(&app, json_request("POST", &uri, json!({}))).await.status(),
        StatusCode::OK
    );

    let open = body_json(send(&app, get("/api/cases?open=true")).await).await;
    assert_eq!(open.as_array().unwrap().len(), 1);
    assert_eq!(open[0]["title"], "waiting");

    let closed = body_json(send(&app, get("/api/cases?open=false")).await).await;
    assert_eq!(closed[0]["title"], "taken");
}

// -- Acceptance ---------------------------------------------------------------

#[tokio::test]
async fn test_accept_moves_new_lead_to_discovery() {
    let app = test_app_with_auth();
    let id = post_case_with_auth(&app).await;

    let response = send(
        &app,
        authed(
            json_request(
                "POST",
                &format!("/api/cases/{id}/accept"),
                json!({"accepted_by": "adv.sharma"}),
            ),
            &lawyer_token(LAWYER_A),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["case"]["stage"], "Discovery");
    assert_eq!(body["case"]["accepted_by"], "adv.sharma");
    assert_eq!(body["case"]["lawyer_id"], LAWYER_A);
    assert_eq!(body["case"]["version"], 2);

    let again = send(
        &app,
        authed(
            json_request("POST", &format!("/api/cases/{id}/accept"), json!({})),
            &lawyer_token(LAWYER_B),
        ),
    )
    .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    let body = body_json(again).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_client_cannot_accept() {
    let app = test_app_with_auth();
    let id = post_case_with_auth(&app).await;
    let response = send(
        &app,
        authed(
            json_request("POST", &format!("/api/cases/{id}/accept"), json!({})),
            &format!("Bearer client:{LAWYER_B}:{SECRET}"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// -- Stage Moves --------------------------------------------------------------

#[tokio::test]
async fn test_advance_moves_one_step_and_bumps_version() {
    let app = test_app();
    let id = case_at(&app, "Discovery").await;

    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/api/cases/{id}/stage/advance"),
            json!({"expected_version": 1}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["case"]["stage"], "Filing");
    assert_eq!(body["case"]["version"], 2);

    let history = body["case"]["stage_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["from"], "Discovery");
    assert_eq!(history[0]["to"], "Filing");
}

#[tokio::test]
async fn test_advance_accepts_empty_body() {
    let app = test_app();
    let id = case_at(&app, "Hearing").await;
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/cases/{id}/stage/advance"))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["case"]["stage"], "Judgment");
}

#[tokio::test]
async fn test_retreat_moves_one_step_back() {
    let app = test_app();
    let id = case_at(&app, "Filing").await;
    let response = send(
        &app,
        json_request("POST", &format!("/api/cases/{id}/stage/retreat"), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["case"]["stage"], "Discovery");
}

#[tokio::test]
async fn test_advance_at_closed_is_noop() {
    let app = test_app();
    let id = case_at(&app, "Closed").await;
    let response = send(
        &app,
        json_request("POST", &format!("/api/cases/{id}/stage/advance"), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["changed"], false);
    assert_eq!(body["case"]["stage"], "Closed");
    assert_eq!(body["case"]["version"], 1);
}

#[tokio::test]
async fn test_retreat_at_new_lead_is_noop() {
    let app = test_app();
    let id = case_at(&app, "New Lead").await;
    let response = send(
        &app,
        json_request("POST", &format!("/api/cases/{id}/stage/retreat"), json!({})),
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["changed"], false);
    assert_eq!(body["case"]["stage"], "New Lead");
    assert_eq!(body["case"]["stage_history"], json!([]));
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let app = test_app();
    let id = case_at(&app, "Discovery").await;
    let uri = format!("/api/cases/{id}/stage/advance");

    let first = send(&app, json_request("POST", &uri, json!({"expected_version": 1}))).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = send(&app, json_request("POST", &uri, json!({"expected_version": 1}))).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "STALE_VERSION");
    assert_eq!(body["error"]["details"]["expected_version"], 1);
    assert_eq!(body["error"]["details"]["current_version"], 2);

    let case = body_json(send(&app, get(&format!("/api/cases/{id}"))).await).await;
    assert_eq!(case["stage"], "Filing");
}

#[tokio::test]
async fn test_set_stage_adjacent_and_same() {
    let app = test_app();
    let id = case_at(&app, "Filing").await;
    let uri = format!("/api/cases/{id}/stage");

    let same = send(&app, json_request("PATCH", &uri, json!({"stage": "Filing"}))).await;
    assert_eq!(same.status(), StatusCode::OK);
    assert_eq!(body_json(same).await["changed"], false);

    let back = send(
        &app,
        json_request("PATCH", &uri, json!({"stage": "Discovery", "expected_version": 1})),
    )
    .await;
    assert_eq!(back.status(), StatusCode::OK);
    let body = body_json(back).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["case"]["stage"], "Discovery");
}

#[tokio::test]
async fn test_set_stage_skip_is_conflict_under_adjacent_policy() {
    let app = test_app();
    let id = case_at(&app, "Discovery").await;
    let response = send(
        &app,
        json_request("PATCH", &format!("/api/cases/{id}/stage"), json!({"stage": "Judgment"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");

    let case = body_json(send(&app, get(&format!("/api/cases/{id}"))).await).await;
    assert_eq!(case["stage"], "Discovery");
    assert_eq!(case["version"], 1);
}

#[tokio::test]
async fn test_set_stage_skip_allowed_under_any_policy() {
    let app = test_app_with_config(AppConfig {
        stage_policy: MovePolicy::Any,
        ..AppConfig::default()
    });
    let id = case_at(&app, "Discovery").await;
    let response = send(
        &app,
        json_request("PATCH", &format!("/api/cases/{id}/stage"), json!({"stage": "Judgment"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["case"]["stage"], "Judgment");
}

#[tokio::test]
async fn test_set_unknown_stage_is_422() {
    let app = test_app();
    let id = case_at(&app, "Discovery").await;
    let response = send(
        &app,
        json_request("PATCH", &format!("/api/cases/{id}/stage"), json!({"stage": "Appeal"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_stage_move_on_unknown_case_is_404() {
    let uri = format!("/api/cases/{}/stage/advance", uuid::Uuid::new_v4());
    let response = send(&test_app(), json_request("POST", &uri, json!({}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Timeline -----------------------------------------------------------------

#[tokio::test]
async fn test_timeline_entry_bumps_version_not_stage() {
    let app = test_app();
    let id = case_at(&app, "Hearing").await;
    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/api/cases/{id}/timeline"),
            json!({"title": "First hearing listed", "status": "upcoming"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["stage"], "Hearing");
    assert_eq!(body["version"], 2);
    assert_eq!(body["timeline"][0]["status"], "upcoming");

    let bad = send(
        &app,
        json_request(
            "POST",
            &format!("/api/cases/{id}/timeline"),
            json!({"title": "x", "status": "someday"}),
        ),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Progress Views -----------------------------------------------------------

#[tokio::test]
async fn test_progress_board_view_classifies_all_six() {
    let app = test_app();
    let id = case_at(&app, "Filing").await;
    let response = send(&app, get(&format!("/api/cases/{id}/progress"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let statuses: Vec<&str> = body["progress"]["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["status"].as_str().unwrap())
        .collect();
    assert_eq!(
        statuses,
        ["completed", "completed", "current", "upcoming", "upcoming", "upcoming"]
    );
    assert_eq!(body["progress"]["percent_complete"], 40);
}

#[tokio::test]
async fn test_progress_trust_view_for_closed_case() {
    let app = test_app();
    let id = case_at(&app, "Closed").await;
    let uri = format!("/api/cases/{id}/progress?view=trust");
    let body = body_json(send(&app, get(&uri)).await).await;
    let steps = body["progress"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 5);
    assert!(steps.iter().all(|s| s["status"] == "completed"));
    assert_eq!(steps[0]["label"], "Reviewing");
    assert_eq!(body["progress"]["percent_complete"], 100);
    assert!(body["progress"]["message"].is_string());
}

#[tokio::test]
async fn test_progress_timeline_view_for_new_lead() {
    let app = test_app();
    let id = case_at(&app, "New Lead").await;
    let body =
        body_json(send(&app, get(&format!("/api/cases/{id}/progress?view=timeline"))).await).await;
    let steps = body["progress"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 5);
    assert!(steps.iter().all(|s| s["status"] == "upcoming"));
}

#[tokio::test]
async fn test_progress_unknown_view_is_422() {
    let app = test_app();
    let id = case_at(&app, "New Lead").await;
    let response = send(&app, get(&format!("/api/cases/{id}/progress?view=gantt"))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Board --------------------------------------------------------------------

#[tokio::test]
async fn test_board_has_six_columns_and_active_count() {
    let app = test_app();
    case_at(&app, "Discovery").await;
    case_at(&app, "Discovery").await;
    case_at(&app, "Closed").await;

    let body = body_json(send(&app, get("/api/board")).await).await;
    let columns = body["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 6);
    assert_eq!(columns[0]["stage"], "New Lead");
    assert_eq!(columns[0]["count"], 0);
    assert_eq!(columns[1]["count"], 2);
    assert_eq!(columns[5]["count"], 1);
    assert_eq!(body["active_count"], 2);
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_board_scoped_to_calling_lawyer() {
    let app = test_app_with_auth();
    let mine = post_case_with_auth(&app).await;
    let theirs = post_case_with_auth(&app).await;
    for (id, lawyer) in [(&mine, LAWYER_A), (&theirs, LAWYER_B)] {
        let response = send(
            &app,
            authed(
                json_request("POST", &format!("/api/cases/{id}/accept"), json!({})),
                &lawyer_token(lawyer),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, authed(get("/api/board"), &lawyer_token(LAWYER_A))).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["columns"][1]["cases"][0]["id"], mine.as_str());

    let response = send(
        &app,
        authed(get("/api/board?lawyer_id=not-a-uuid"), &lawyer_token(LAWYER_A)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Insights -----------------------------------------------------------------

fn seeded_case(title: &str, stage: CaseStage, idle_days: i64, timeline: usize) -> CaseRecord {
    let mut case = CaseRecord::new(title);
    case.stage = stage;
    case.updated_at = chrono::Utc::now() - chrono::Duration::days(idle_days);
    for i in 0..timeline {
        case.timeline.push(
            TimelineEntry::new(format!("Update {i}"), TimelineStatus::Completed, "").unwrap(),
        );
    }
    case
}

#[tokio::test]
async fn test_insights_rank_cases_by_health() {
    let state = AppState::new();
    for case in [
        seeded_case("Healthy", CaseStage::Filing, 1, 3),
        seeded_case("Quiet", CaseStage::Hearing, 10, 3),
        seeded_case("Neglected", CaseStage::Discovery, 10, 0),
        seeded_case("Done", CaseStage::Closed, 1, 5),
    ] {
        state.cases.insert(case.key(), case);
    }
    let app = nyay_api::app(state);

    let response = send(&app, get("/api/insights")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["workload"]["status"], "Light");
    assert_eq!(body["workload"]["active_cases"], 3);
    assert_eq!(body["total"], 4);

    let cases = body["cases"].as_array().unwrap();
    assert_eq!(cases.len(), 4);
    assert_eq!(cases[0]["title"], "Neglected");
    assert_eq!(cases[0]["health"], 85);
    assert_eq!(
        cases[0]["health_issues"],
        json!(["no_recent_activity", "timeline_incomplete"])
    );
    assert_eq!(cases[0]["next_action"], "update_case_stage");
    assert_eq!(cases[1]["title"], "Quiet");
    assert_eq!(cases[1]["health"], 90);
    assert_eq!(cases[1]["next_action"], "follow_up_with_client");
    assert_eq!(cases[2]["health"], 100);
    assert_eq!(cases[2]["next_action"], "monitor_case");

    let body = body_json(send(&app, get("/api/insights?limit=1")).await).await;
    assert_eq!(body["cases"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], 4);
}

#[tokio::test]
async fn test_insights_workload_bands() {
    let state = AppState::new();
    for i in 0..16 {
        let case = seeded_case(&format!("Matter {i}"), CaseStage::Hearing, 0, 2);
        state.cases.insert(case.key(), case);
    }
    let app = nyay_api::app(state.clone());
    let body = body_json(send(&app, get("/api/insights")).await).await;
    assert_eq!(body["workload"]["status"], "Overloaded");
    assert_eq!(body["workload"]["active_cases"], 16);
    assert_eq!(body["cases"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_insights_bad_limit() {
    let app = test_app();
    let response = send(&app, get("/api/insights?limit=0")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let response = send(&app, get("/api/insights?limit=lots")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_insights_scoped_to_calling_lawyer() {
    let app = test_app_with_auth();
    let mine = post_case_with_auth(&app).await;
    post_case_with_auth(&app).await;
    let response = send(
        &app,
        authed(
            json_request("POST", &format!("/api/cases/{mine}/accept"), json!({})),
            &lawyer_token(LAWYER_A),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, authed(get("/api/insights"), &lawyer_token(LAWYER_A))).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["cases"][0]["case_id"], mine.as_str());
}

// -- Authentication -----------------------------------------------------------

fn authed(mut request: Request<Body>, token: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert("authorization", token.parse().unwrap());
    request
}

async fn post_case_with_auth(app: &axum::Router) -> String {
    let request = authed(
        json_request("POST", "/api/cases", json!({"title": "Consumer complaint"})),
        &format!("Bearer client:{LAWYER_B}:{SECRET}"),
    );
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let response = send(&test_app_with_auth(), get("/api/cases")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_wrong_secret_is_401() {
    let response = send(
        &test_app_with_auth(),
        authed(get("/api/cases"), "Bearer wrong-secret"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let response = send(&test_app_with_auth(), get("/health/liveness")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_other_lawyer_cannot_move_assigned_case() {
    let app = test_app_with_auth();
    let id = post_case_with_auth(&app).await;
    send(
        &app,
        authed(
            json_request("POST", &format!("/api/cases/{id}/accept"), json!({})),
            &lawyer_token(LAWYER_A),
        ),
    )
    .await;

    let response = send(
        &app,
        authed(
            json_request("POST", &format!("/api/cases/{id}/stage/advance"), json!({})),
            &lawyer_token(LAWYER_B),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        authed(
            json_request("POST", &format!("/api/cases/{id}/stage/advance"), json!({})),
            &lawyer_token(LAWYER_A),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["case"]["stage"], "Filing");
}

#[tokio::test]
async fn test_client_cannot_move_stage() {
    let app = test_app_with_auth();
    let id = post_case_with_auth(&app).await;
    let response = send(
        &app,
        authed(
            json_request("PATCH", &format!("/api/cases/{id}/stage"), json!({"stage": "Discovery"})),
            &format!("Bearer client:{LAWYER_B}:{SECRET}"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// -- Rate Limiting ------------------------------------------------------------

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let app = test_app_with_config(AppConfig {
        rate_limit: nyay_api::middleware::rate_limit::RateLimitConfig {
            max_requests: 2,
            window_secs: 60,
        },
        ..AppConfig::default()
    });
    for _ in 0..2 {
        assert_eq!(send(&app, get("/api/stages")).await.status(), StatusCode::OK);
    }
    let response = send(&app, get("/api/stages")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["error"]["code"], "RATE_LIMITED");
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_spec_lists_case_routes() {
    let response = send(&test_app(), get("/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/api/cases/{id}/stage"].is_object());
    assert!(body["paths"]["/api/board"].is_object());
}
