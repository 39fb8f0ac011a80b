// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use booth_config::model::GatewayConfig;
use booth_core::BoothError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, AppState};

/// Build the application router.
///
/// Split out from [`start_server`] so tests can drive it with
/// `tower::ServiceExt::oneshot` without binding a socket.
pub fn router(state: AppState) -> Router {
    // Base64 inflates payloads by 4/3; leave headroom over the decoded cap.
    let body_limit = state.max_photo_bytes + state.max_photo_bytes / 2;

    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/register", post(handlers::post_register))
        .route("/v1/verify", post(handlers::post_verify))
        .route("/v1/kiosks", get(handlers::get_kiosks))
        .route("/v1/kiosks/{id}/session", get(handlers::get_kiosk_session))
        .route("/v1/photos", post(handlers::post_photo))
        .route("/v1/photos/{session_id}", get(handlers::get_photo))
        .route("/v1/photos/{session_id}/keep", post(handlers::post_keep))
        .route(
            "/v1/photos/{session_id}/discard",
            post(handlers::post_discard),
        )
        .route(
            "/v1/photos/{session_id}/retake",
            post(handlers::post_retake),
        )
        .route("/v1/admin/stats", get(handlers::get_admin_stats))
        .route("/v1/admin/sessions", get(handlers::get_admin_sessions))
        .route("/v1/admin/reset", post(handlers::post_admin_reset))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start_server(config: &GatewayConfig, state: AppState) -> Result<(), BoothError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BoothError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| BoothError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
