//! REST API routes for the session.
//!
//! Every state-changing route returns the full [`SessionSnapshot`] after the
//! operation, so the frontend renders from one authoritative payload instead
//! of stitching partial responses together. Flow failures (a bad repository
//! fetch, a rejected AI response) live inside the snapshot; an HTTP error
//! status is reserved for precondition violations such as acting before a
//! repository was imported.

use crate::error::AppError;
use crate::session::{SessionController, SessionSnapshot};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ── Error handling ───────────────────────────────────────────────────────────

/// JSON error response matching AppError shape for the frontend.
#[derive(Serialize)]
struct ApiError {
    code: String,
    message: String,
}

/// Wrapper to make AppError usable as an axum error response.
struct ApiErr(AppError);

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::GitHubApi { .. }
            | AppError::AiApi { .. }
            | AppError::InvalidAiResponse { .. }
            | AppError::Network { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::Configuration { .. } | AppError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        (
            status,
            Json(ApiError {
                code: code.to_string(),
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

// ── Shared state ─────────────────────────────────────────────────────────────

/// Shared state for the session API routes.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
}

// ── Request body types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ImportBody {
    url: String,
}

#[derive(Deserialize)]
struct PathBody {
    path: String,
}

// ── Routes ───────────────────────────────────────────────────────────────────

/// Session API routes, to be nested or merged into the server router.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/import", post(import_repository))
        .route("/api/session/reset", post(reset_session))
        .route("/api/session/tree/load", post(load_tree))
        .route("/api/session/tree/toggle", post(toggle_dir))
        .route("/api/session/analyze", post(analyze))
        .route("/api/session/select", post(select_file))
        .route("/api/session/explain", post(explain))
}

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.snapshot().await)
}

async fn import_repository(
    State(state): State<AppState>,
    Json(body): Json<ImportBody>,
) -> Result<Json<SessionSnapshot>, ApiErr> {
    Ok(Json(state.controller.import(&body.url).await?))
}

async fn reset_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.reset().await)
}

async fn load_tree(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiErr> {
    Ok(Json(state.controller.load_tree().await?))
}

async fn toggle_dir(
    State(state): State<AppState>,
    Json(body): Json<PathBody>,
) -> Result<Json<SessionSnapshot>, ApiErr> {
    Ok(Json(state.controller.toggle_dir(&body.path).await?))
}

async fn analyze(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiErr> {
    Ok(Json(state.controller.analyze().await?))
}

async fn select_file(
    State(state): State<AppState>,
    Json(body): Json<PathBody>,
) -> Result<Json<SessionSnapshot>, ApiErr> {
    Ok(Json(state.controller.select_file(&body.path).await?))
}

async fn explain(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiErr> {
    Ok(Json(state.controller.explain().await?))
}
