//! Router-level tests against the in-memory store

use api::auth::sign_user_token;
use api::AppState;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::config::{Config, StoreKind};
use db::MemoryStreakStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

const AUTH_SECRET: &str = "test-auth-secret";
const SERVICE_TOKEN: &str = "test-service-token";

fn test_app() -> Router {
    let config = Config {
        database_url: String::new(),
        host: "127.0.0.1".to_string(),
        port: 0,
        auth_secret: AUTH_SECRET.to_string(),
        service_token: SERVICE_TOKEN.to_string(),
        store: StoreKind::Memory,
    };
    let state = Arc::new(AppState::new(config, Arc::new(MemoryStreakStore::new())));
    api::app(state)
}

fn get(path: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(path: &str, bearer: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_user(app: &Router, user_id: Uuid) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/internal/users",
            SERVICE_TOKEN,
            json!({ "id": user_id, "email": "ada@codeclash.dev", "handle": "ada" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn record_solve(app: &Router, user_id: Uuid, points: i64) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/internal/solve",
            SERVICE_TOKEN,
            json!({ "user_id": user_id, "points": points }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn streak_routes_require_a_valid_token() {
    let app = test_app();

    let response = app.clone().oneshot(get("/streak/user", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let forged = format!("{}.deadbeef", Uuid::new_v4());
    let response = app
        .oneshot(get("/streak/user", Some(&forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn internal_routes_reject_user_tokens() {
    let app = test_app();
    let user_token = sign_user_token(Uuid::new_v4(), AUTH_SECRET);

    let response = app
        .oneshot(post_json(
            "/internal/solve",
            &user_token,
            json!({ "user_id": Uuid::new_v4(), "points": 10 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn summary_for_unknown_user_is_404() {
    let app = test_app();
    let token = sign_user_token(Uuid::new_v4(), AUTH_SECRET);

    let response = app.oneshot(get("/streak/user", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn solve_flow_updates_the_summary() {
    let app = test_app();
    let user_id = Uuid::new_v4();
    register_user(&app, user_id).await;

    let token = sign_user_token(user_id, AUTH_SECRET);
    let response = app.clone().oneshot(get("/streak/user", Some(&token))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["streak"]["current_streak"], 0);
    assert_eq!(body["streak"]["badge"], "none");
    assert_eq!(body["streak"]["today_solved"], false);

    record_solve(&app, user_id, 100).await;
    record_solve(&app, user_id, 50).await;

    let response = app.clone().oneshot(get("/streak/user", Some(&token))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["streak"]["current_streak"], 1);
    assert_eq!(body["streak"]["today_solved"], true);
    assert_eq!(body["streak"]["today_points"], 150);
}

#[tokio::test]
async fn freeze_endpoint_maps_domain_errors_to_statuses() {
    let app = test_app();
    let user_id = Uuid::new_v4();
    register_user(&app, user_id).await;
    let token = sign_user_token(user_id, AUTH_SECRET);

    // No tokens yet
    let response = app
        .clone()
        .oneshot(post_json("/streak/freeze", &token, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "no_freeze_available");

    // Grant one and spend it
    let response = app
        .clone()
        .oneshot(post_json(
            "/internal/freezes/grant",
            SERVICE_TOKEN,
            json!({ "user_id": user_id, "count": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["freezes_available"], 1);

    let response = app
        .clone()
        .oneshot(post_json("/streak/freeze", &token, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["streak"]["freezes_available"], 0);
    assert_eq!(body["streak"]["current_streak"], 1);

    // Today is frozen now: a second freeze is a conflict
    let response = app
        .clone()
        .oneshot(post_json("/streak/freeze", &token, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "already_active");
}

#[tokio::test]
async fn calendar_validates_month_and_returns_a_grid() {
    let app = test_app();
    let user_id = Uuid::new_v4();
    register_user(&app, user_id).await;
    let token = sign_user_token(user_id, AUTH_SECRET);

    let response = app
        .clone()
        .oneshot(get("/streak/calendar?year=2024&month=13", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/streak/calendar?year=300000&month=2", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "bad_request");

    let response = app
        .clone()
        .oneshot(get("/streak/calendar?year=2024&month=2", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let days = body["calendar"].as_array().unwrap();
    assert_eq!(days.len(), 29);
    assert_eq!(days[0]["date"], "2024-02-01");
    assert_eq!(days[0]["problems_solved"], 0);

    // Omitted params default to the current month
    let response = app
        .oneshot(get("/streak/calendar", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn leaderboard_is_public_and_sorted() {
    let app = test_app();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    register_user(&app, first).await;
    register_user(&app, second).await;
    record_solve(&app, first, 10).await;

    let response = app
        .oneshot(get("/streak/leaderboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let rows = body["leaderboard"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["current_streak"], 1);
    assert_eq!(rows[0]["email"], "ada@codeclash.dev");
    assert_eq!(rows[1]["current_streak"], 0);
}
