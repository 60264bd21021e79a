//! End-to-end tests for the HTTP API, run against the real router with a
//! temporary SQLite database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use waveboard::server::{self, AppState};
use waveboard::storage::SqliteStore;

fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open_at(dir.path().join("test.db")).unwrap();
    let state = Arc::new(AppState::new(Arc::new(store)));
    (server::router(state, None), dir)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn submit_then_read_back_round_trip() {
    let (app, _dir) = test_app();

    let (status, body) = post_json(
        &app,
        "/api/scores",
        json!({"score": 100, "wave": 5, "accuracy": 97.5, "difficulty": "normal"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["best"]["score"], 100);

    let (status, body) = get(&app, "/api/scores?difficulty=normal&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let scores = body["scores"].as_array().unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0]["score"], 100);
    assert_eq!(scores[0]["wave"], 5);
    assert_eq!(scores[0]["player_name"], "Anonymous");
}

#[tokio::test]
async fn missing_wave_is_rejected_and_nothing_is_saved() {
    let (app, _dir) = test_app();

    let (status, body) = post_json(&app, "/api/scores", json!({"score": 100})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, body) = get(&app, "/api/scores").await;
    assert!(body["scores"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/scores")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_score_is_rejected() {
    let (app, _dir) = test_app();
    let (status, _) = post_json(&app, "/api/scores", json!({"score": -1, "wave": 2})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_requires_a_known_difficulty() {
    let (app, _dir) = test_app();

    let (status, _) = get(&app, "/api/stats").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/stats?difficulty=nightmare").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_are_null_for_an_empty_window() {
    let (app, _dir) = test_app();
    let (status, body) = get(&app, "/api/stats?difficulty=expert").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["stats"].is_null());
}

#[tokio::test]
async fn stats_report_reflects_submissions() {
    let (app, _dir) = test_app();

    let accuracies = [100.0, 100.0, 100.0, 90.0, 90.0, 80.0, 80.0, 80.0, 80.0, 70.0];
    for (i, acc) in accuracies.iter().enumerate() {
        let (status, _) = post_json(
            &app,
            "/api/scores",
            json!({"score": 50 + i, "wave": 2, "accuracy": acc, "difficulty": "expert"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get(&app, "/api/stats?difficulty=expert").await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["stats"];
    assert_eq!(stats["games"], 10);
    assert_eq!(stats["distribution"]["97-100"], 3);
    assert_eq!(stats["distribution"]["95-97"], 0);
    assert_eq!(stats["distribution"]["90-95"], 2);
    assert_eq!(stats["distribution"]["80-90"], 4);
    assert_eq!(stats["distribution"]["<80"], 1);
    // Under 20 games: no trend in the payload.
    assert!(stats.get("trend").is_none());
    // Other tiers stay empty.
    let (_, body) = get(&app, "/api/stats?difficulty=normal").await;
    assert!(body["stats"].is_null());
}

#[tokio::test]
async fn unrecognized_difficulty_saves_the_score_but_feeds_no_window() {
    let (app, _dir) = test_app();

    let (status, body) = post_json(
        &app,
        "/api/scores",
        json!({"score": 10, "wave": 1, "accuracy": 90.0, "difficulty": "nightmare"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);

    for tier in ["beginner", "normal", "expert"] {
        let (_, body) = get(&app, &format!("/api/stats?difficulty={tier}")).await;
        assert!(body["stats"].is_null(), "window for {tier} should be empty");
    }
}

#[tokio::test]
async fn player_best_is_case_sensitive() {
    let (app, _dir) = test_app();

    post_json(
        &app,
        "/api/scores",
        json!({"score": 300, "wave": 4, "player_name": "Ada"}),
    )
    .await;
    post_json(
        &app,
        "/api/scores",
        json!({"score": 700, "wave": 9, "player_name": "Ada"}),
    )
    .await;

    let (status, body) = get(&app, "/api/scores/player/Ada").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["best"]["score"], 700);

    let (_, body) = get(&app, "/api/scores/player/ada").await;
    assert!(body["best"].is_null());
}

#[tokio::test]
async fn global_best_is_null_when_empty() {
    let (app, _dir) = test_app();
    let (status, body) = get(&app, "/api/scores/best").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["best"].is_null());
}

#[tokio::test]
async fn unknown_api_route_is_a_json_404() {
    let (app, _dir) = test_app();
    let (status, body) = get(&app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/scores")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn responses_carry_cors_headers() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/scores")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _dir) = test_app();
    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}
