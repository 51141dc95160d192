//! HTTP/WebSocket API for the Truco server.
//!
//! # Endpoints
//!
//! ```text
//! GET  /health                        - Health check
//! POST /api/v1/matches                - Create a match
//! GET  /api/v1/matches/{match_id}     - Match state
//! GET  /ws?token=<player token>       - Live command/event session
//! ```
//!
//! The WebSocket carries the full command set (`create-match`,
//! `join-match`, `set-ready`, `start-hand`, `play-card`, `get-state`); the
//! REST routes cover the read side and match creation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use truco::{db::InMemoryMatchRepository, table::MatchManager};
//! use truco_server::api::{AppState, create_router};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = MatchManager::new(Arc::new(InMemoryMatchRepository::new()));
//! let app = create_router(AppState::new(manager, None, 12));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! CORS is permissive; put the server behind a proxy that narrows origins
//! in production.

pub mod matches;
pub mod rate_limiter;
pub mod request_id;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::{Arc, atomic::AtomicU64};
use tower_http::cors::CorsLayer;
use truco::{db::Database, table::MatchManager};

/// State shared by every handler and WebSocket session.
#[derive(Clone)]
pub struct AppState {
    pub manager: MatchManager,
    /// Pool behind the match repository, when storage is PostgreSQL
    pub database: Option<Database>,
    /// Threshold for matches created without one
    pub default_points_to_win: u32,
    /// Open WebSocket sessions
    pub connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        manager: MatchManager,
        database: Option<Database>,
        default_points_to_win: u32,
    ) -> Self {
        Self {
            manager,
            database,
            default_points_to_win,
            connections: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Build the router with every endpoint and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/matches", post(matches::create_match))
        .route("/matches/{match_id}", get(matches::get_match));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check for monitoring and load balancers.
///
/// `200 OK` when healthy, `503 Service Unavailable` when the database does
/// not answer.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","storage":"memory","database":true,"matches":{"active_count":0},...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.database {
        Some(database) => ("postgres", database.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "matches": {
            "active_count": state.manager.active_matches().await,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
