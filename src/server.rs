//! HTTP server hosting the session API and the frontend bundle.
//!
//! Serves the static frontend from the configured dist directory with an
//! SPA fallback, and mounts the session API under `/api`. Unmatched `/api`
//! paths get a plain 404 so the frontend never misparses HTML as JSON.

use crate::api::{session_routes, AppState};
use crate::config::Config;
use crate::error::AppError;
use crate::session::SessionController;
use axum::body::Body;
use axum::http::{Request, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Build the full application router.
///
/// The static directory is optional: without one (or without an
/// `index.html` inside it) the server still exposes the API, and
/// non-API paths get a 404 instead of the SPA shell.
pub fn build_router(controller: Arc<SessionController>, static_dir: &Path) -> Router {
    let state = AppState { controller };

    // Read index.html once at startup for the SPA fallback.
    let index_html: Option<Arc<str>> = std::fs::read_to_string(static_dir.join("index.html"))
        .ok()
        .map(Into::into);
    if index_html.is_none() {
        tracing::warn!(dir = %static_dir.display(), "No index.html found; serving API only");
    }

    let dist = static_dir.to_path_buf();
    Router::new()
        .merge(session_routes().with_state(state))
        .layer(CorsLayer::permissive())
        .fallback(move |uri: Uri| {
            let html = index_html.clone();
            let dist = dist.clone();
            async move { spa_fallback(uri, &dist, html.as_deref()).await }
        })
}

/// Bind the listener and serve until Ctrl-C or cancellation.
pub async fn run(config: Config, controller: Arc<SessionController>) -> Result<(), AppError> {
    let app = build_router(controller, &config.static_dir);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to port {}: {}", config.port, e)))?;

    tracing::info!("Server listening on http://0.0.0.0:{}", config.port);

    let cancel_token = CancellationToken::new();
    let cancel_clone = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            cancel_clone.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// SPA-aware fallback handler.
///
/// 1. API paths that didn't match a route get a plain 404.
/// 2. Try to serve a static file from the dist directory.
/// 3. If no file matches, return `index.html` so the frontend router can
///    handle client-side routes.
async fn spa_fallback(uri: Uri, dist: &PathBuf, index_html: Option<&str>) -> Response {
    // Never serve HTML for API routes — the frontend expects JSON.
    if uri.path().starts_with("/api/") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let Some(index_html) = index_html else {
        return StatusCode::NOT_FOUND.into_response();
    };

    // Try to serve a static file (JS, CSS, images, etc.).
    let req = match Request::builder().uri(&uri).body(Body::empty()) {
        Ok(req) => req,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    match ServeDir::new(dist).oneshot(req).await {
        Ok(res) if res.status() != StatusCode::NOT_FOUND => res.into_response(),
        // No matching static file → serve index.html for client-side routing.
        _ => Html(index_html.to_owned()).into_response(),
    }
}
