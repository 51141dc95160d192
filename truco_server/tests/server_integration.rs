//! HTTP surface: health, match creation and lookup, request ids.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tower::ServiceExt; // For `oneshot` method
use truco::{db::InMemoryMatchRepository, table::MatchManager};
use truco_server::api::{AppState, create_router, request_id::REQUEST_ID_HEADER};

fn create_test_server() -> (axum::Router, MatchManager) {
    let manager = MatchManager::new(Arc::new(InMemoryMatchRepository::new()));
    let app = create_router(AppState::new(manager.clone(), None, 12));
    (app, manager)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server();

    let result = timeout(Duration::from_secs(5), app.oneshot(get("/health"))).await;
    let response = result.expect("health check timed out").unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["matches"]["active_count"], 0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");

    let response = app.oneshot(get("/health")).await.unwrap();
    let generated = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

// ============================================================================
// Match Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_create_then_get_match() {
    let (app, manager) = create_test_server();

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/matches", json!({ "pointsToWin": 3 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let match_id = body_json(response).await["matchId"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(manager.service().exists(&match_id).await.unwrap());

    let response = app
        .oneshot(get(&format!("/api/v1/matches/{match_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["matchId"], match_id.as_str());
    assert_eq!(body["state"], "waiting");
    assert_eq!(body["pointsToWin"], 3);
    assert_eq!(body["score"], json!({ "sideA": 0, "sideB": 0 }));
    assert_eq!(body["roundsPlayed"], 0);
}

#[tokio::test]
async fn test_create_match_uses_default_threshold() {
    let (app, manager) = create_test_server();

    let response = app
        .oneshot(post_json("/api/v1/matches", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let match_id = body_json(response).await["matchId"]
        .as_str()
        .unwrap()
        .to_string();

    let view = manager.view_state(&match_id).await.unwrap();
    assert_eq!(view.points_to_win, 12);
}

#[tokio::test]
async fn test_create_match_rejects_non_positive_threshold() {
    let (app, manager) = create_test_server();

    let response = app
        .oneshot(post_json("/api/v1/matches", json!({ "pointsToWin": 0 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "pointsToWin must be greater than 0"
    );
    assert_eq!(manager.active_matches().await, 0);
}

#[tokio::test]
async fn test_create_match_rejects_malformed_body() {
    let (app, _) = create_test_server();

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/matches", json!({ "pointsToWin": 1.5 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("pointsToWin"), "{error}");

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/matches")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_unknown_match_is_not_found() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(get("/api/v1/matches/match_999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "match not found");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = create_test_server();
    let response = app.oneshot(get("/api/v1/tables")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
