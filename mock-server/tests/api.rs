use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

async fn check_in(app: &Router, student_id: &str, full_name: &str) -> Value {
    let body = serde_json::json!({"student_id": student_id, "full_name": full_name}).to_string();
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/auto/check-in", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- check-in ---

#[tokio::test]
async fn first_check_in_creates_student() {
    let app = app();
    let json = check_in(&app, "S001", "Ada Lovelace").await;

    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Check-in successful");
    assert_eq!(json["data"]["student_id"], "S001");
    assert_eq!(json["data"]["student_name"], "Ada Lovelace");
    assert_eq!(json["data"]["is_new_student"], true);
    assert!(json["data"]["check_in_id"].is_i64());
}

#[tokio::test]
async fn repeat_check_in_keeps_original_name() {
    let app = app();
    check_in(&app, "S001", "Ada Lovelace").await;
    let json = check_in(&app, "S001", "Someone Else").await;

    assert_eq!(json["data"]["is_new_student"], false);
    assert_eq!(json["data"]["student_name"], "Ada Lovelace");
}

#[tokio::test]
async fn check_in_with_blank_id_returns_400_envelope() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auto/check-in",
            r#"{"student_id":"  ","full_name":"Ada"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn check_in_malformed_json_is_rejected() {
    let resp = app()
        .oneshot(json_request("POST", "/api/auto/check-in", r#"{"student_id":1}"#))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
    let body = body_bytes(resp).await;
    assert!(!body.is_empty());
}

// --- students / check-ins ---

#[tokio::test]
async fn list_students_reports_total() {
    let app = app();
    check_in(&app, "S002", "Grace Hopper").await;
    check_in(&app, "S001", "Ada Lovelace").await;

    let resp = app.oneshot(get("/api/auto/students")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["students"][0]["student_id"], "S001");
}

#[tokio::test]
async fn check_ins_are_listed_per_student() {
    let app = app();
    check_in(&app, "S001", "Ada").await;
    check_in(&app, "S001", "Ada").await;
    check_in(&app, "S002", "Grace").await;

    let resp = app.oneshot(get("/api/auto/check-ins/S001")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["check_ins"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn check_ins_for_unknown_student_is_404() {
    let resp = app().oneshot(get("/api/auto/check-ins/nobody")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Student not found");
}

// --- reviews ---

async fn submit(app: &Router, student_id: &str, app_name: &str) -> axum::response::Response {
    let body = serde_json::json!({
        "student_id": student_id,
        "mobile_app_name": app_name,
        "review_text": "Useful",
    })
    .to_string();
    app.clone()
        .oneshot(json_request("POST", "/api/reviews", &body))
        .await
        .unwrap()
}

#[tokio::test]
async fn submit_review_returns_201() {
    let app = app();
    check_in(&app, "S001", "Ada").await;

    let resp = submit(&app, "S001", "Notes").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["student_name"], "Ada");
    assert_eq!(json["data"]["mobile_app_name"], "Notes");
    assert!(json["data"]["submitted_at"].is_string());
}

#[tokio::test]
async fn review_from_unknown_student_is_404() {
    let resp = submit(&app(), "ghost", "Notes").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reviews_filter_and_paginate() {
    let app = app();
    check_in(&app, "S001", "Ada").await;
    submit(&app, "S001", "Notes").await;
    submit(&app, "S001", "Focus").await;
    submit(&app, "S001", "Notes").await;

    let resp = app
        .clone()
        .oneshot(get("/api/reviews?app_name=Notes&limit=1"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["total_reviews"], 2);
    assert_eq!(json["data"]["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["showing"]["limit"], 1);
    assert_eq!(json["data"]["showing"]["app_name_filter"], "Notes");

    let resp = app.oneshot(get("/api/reviews/S001")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["total_reviews"], 3);
    assert!(json["data"]["showing"].get("app_name_filter").is_none());
}

// --- leaderboard ---

#[tokio::test]
async fn leaderboard_ranks_by_marks() {
    let app = app();
    check_in(&app, "S001", "Ada").await;
    check_in(&app, "S002", "Grace").await;
    check_in(&app, "S002", "Grace").await;

    let resp = app.oneshot(get("/api/leaderboard?limit=50&offset=0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let board = json["data"]["leaderboard"].as_array().unwrap();
    assert_eq!(board[0]["student_id"], "S002");
    assert_eq!(board[0]["rank"], 1);
    assert_eq!(board[0]["total_check_ins"], 2);
    assert_eq!(board[1]["rank"], 2);
    assert_eq!(json["data"]["total_students"], 2);
    assert_eq!(json["data"]["showing"]["total_pages"], 1);
    assert_eq!(json["data"]["showing"]["current_page"], 1);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app().oneshot(get("/api/nonexistent")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
