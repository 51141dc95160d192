//! REST endpoints for creating and inspecting matches.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use truco::{
    db::RepositoryError,
    service::{MatchStateView, ServiceError},
};

use super::{AppState, request_id::RequestId};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    #[serde(default)]
    pub points_to_win: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchResponse {
    pub match_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// HTTP status for a failed use case, with the client-safe message.
pub fn api_error(error: &ServiceError) -> ApiError {
    let status = match error {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::MatchNotFound(_) | ServiceError::Repository(RepositoryError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        ServiceError::Game(_) | ServiceError::Room(_) => StatusCode::CONFLICT,
        ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %error, "Match request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: error.client_message(),
        }),
    )
}

/// `POST /api/v1/matches`
///
/// Body: `{"pointsToWin": 12}`, threshold optional. Replies `201` with the
/// new match id. A body that does not parse is a `400` like any other
/// validation failure.
pub async fn create_match(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<CreateMatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateMatchResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(request_id = request_id.as_str(), "Rejected match body: {}", rejection);
        api_error(&ServiceError::validation(rejection.body_text()))
    })?;
    let points_to_win = request
        .points_to_win
        .or(Some(i64::from(state.default_points_to_win)));

    let match_id = state
        .manager
        .create_match(points_to_win)
        .await
        .map_err(|e| api_error(&e))?;

    metrics::matches_created_total();
    metrics::active_matches(state.manager.active_matches().await);
    tracing::info!(request_id = request_id.as_str(), match_id = %match_id, "Match created");

    Ok((StatusCode::CREATED, Json(CreateMatchResponse { match_id })))
}

/// `GET /api/v1/matches/{match_id}`
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<MatchStateView>, ApiError> {
    state
        .manager
        .view_state(&match_id)
        .await
        .map(Json)
        .map_err(|e| api_error(&e))
}
