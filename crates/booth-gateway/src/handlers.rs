// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the booth REST API.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use booth_core::types::{
    DeliveryRecord, KioskDisplay, KioskLease, NewSession, Session, SessionState, VerifyOutcome,
};
use booth_core::BoothError;
use booth_session::{AdminStats, SessionStateMachine};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::validate;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub machine: Arc<SessionStateMachine>,
    /// Cap on decoded photo size.
    pub max_photo_bytes: usize,
}

/// Request body for POST /v1/register.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub kiosk_id: u16,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub consent: bool,
}

/// Response body for POST /v1/register.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub session_id: String,
    pub guest_name: String,
    /// The code shown on the kiosk; echoed for UI testing setups.
    pub verification_code: String,
    pub code_expires_at: String,
}

/// Request body for POST /v1/verify.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub session_id: String,
    pub code: String,
}

/// Response body for POST /v1/verify.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub outcome: VerifyOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

/// Request body for POST /v1/photos.
#[derive(Debug, Deserialize)]
pub struct PhotoUploadRequest {
    pub session_id: String,
    pub photo_base64: String,
}

/// Response body for GET /v1/photos/{session_id}.
#[derive(Debug, Serialize)]
pub struct PhotoStatusResponse {
    pub ready: bool,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_base64: Option<String>,
}

/// Response body for the keep decision.
#[derive(Debug, Serialize)]
pub struct KeepResponse {
    pub state: SessionState,
    pub delivery: DeliveryRecord,
}

/// Generic state acknowledgement.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: SessionState,
}

/// Query parameters for GET /v1/admin/sessions.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

/// Admin view of one session; photo bytes are never included.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub kiosk_id: u16,
    pub guest_name: String,
    pub guest_phone: String,
    pub state: SessionState,
    pub verification_attempts: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Session> for SessionSummary {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            kiosk_id: s.kiosk_id,
            guest_name: s.guest_name,
            guest_phone: s.guest_phone,
            state: s.state,
            verification_attempts: s.verification_attempts,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// POST /v1/register
pub async fn post_register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let guest_name = validate::sanitize_name(&body.name)?;
    let guest_phone = validate::normalize_phone(&body.phone)?;
    let guest_email = validate::validate_email(body.email.as_deref())?;

    let session = state
        .machine
        .register(NewSession {
            kiosk_id: body.kiosk_id,
            guest_name,
            guest_phone,
            guest_email,
            consent: body.consent,
        })
        .await?;

    Ok(Json(RegisterResponse {
        session_id: session.id,
        guest_name: session.guest_name,
        verification_code: session.verification_code.unwrap_or_default(),
        code_expires_at: session.code_expires_at.unwrap_or_default(),
    }))
}

/// POST /v1/verify
pub async fn post_verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    validate::validate_code(&body.code)?;
    let result = state.machine.verify(&body.session_id, &body.code).await?;
    Ok(Json(VerifyResponse {
        outcome: result.outcome,
        attempts_remaining: result.attempts_remaining,
    }))
}

/// GET /v1/kiosks/{id}/session — the kiosk's poll loop.
pub async fn get_kiosk_session(
    State(state): State<AppState>,
    Path(kiosk_id): Path<u16>,
) -> Result<Json<KioskDisplay>, ApiError> {
    Ok(Json(state.machine.kiosk_state(kiosk_id).await?))
}

/// GET /v1/kiosks — lease board.
pub async fn get_kiosks(
    State(state): State<AppState>,
) -> Result<Json<Vec<KioskLease>>, ApiError> {
    Ok(Json(state.machine.lease_statuses().await?))
}

/// POST /v1/photos — capture upload from the kiosk.
pub async fn post_photo(
    State(state): State<AppState>,
    Json(body): Json<PhotoUploadRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    let photo = BASE64
        .decode(body.photo_base64.as_bytes())
        .map_err(|_| BoothError::Validation {
            field: "photo_base64".to_string(),
            reason: "not valid base64".to_string(),
        })?;
    if photo.len() > state.max_photo_bytes {
        return Err(BoothError::Validation {
            field: "photo_base64".to_string(),
            reason: format!("decoded photo exceeds {} bytes", state.max_photo_bytes),
        }
        .into());
    }
    if !validate::looks_like_image(&photo) {
        return Err(BoothError::Validation {
            field: "photo_base64".to_string(),
            reason: "payload is not a JPEG, PNG, or GIF image".to_string(),
        }
        .into());
    }

    state.machine.upload_photo(&body.session_id, photo).await?;
    Ok(Json(StateResponse {
        state: SessionState::ReviewPending,
    }))
}

/// GET /v1/photos/{session_id} — phone poll for the captured photo.
pub async fn get_photo(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<PhotoStatusResponse>, ApiError> {
    let status = state.machine.check_photo(&session_id).await?;
    Ok(Json(PhotoStatusResponse {
        ready: status.ready,
        state: status.state,
        photo_base64: status.photo.map(|bytes| BASE64.encode(bytes)),
    }))
}

/// POST /v1/photos/{session_id}/keep
pub async fn post_keep(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<KeepResponse>, ApiError> {
    let delivery = state.machine.keep_photo(&session_id).await?;
    Ok(Json(KeepResponse {
        state: SessionState::Completed,
        delivery,
    }))
}

/// POST /v1/photos/{session_id}/discard
pub async fn post_discard(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    state.machine.discard_photo(&session_id).await?;
    Ok(Json(StateResponse {
        state: SessionState::Discarded,
    }))
}

/// POST /v1/photos/{session_id}/retake
pub async fn post_retake(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    state.machine.retake(&session_id).await?;
    Ok(Json(StateResponse {
        state: SessionState::PhotoPending,
    }))
}

/// GET /v1/admin/stats
pub async fn get_admin_stats(
    State(state): State<AppState>,
) -> Result<Json<AdminStats>, ApiError> {
    Ok(Json(state.machine.stats().await?))
}

/// GET /v1/admin/sessions?limit=
pub async fn get_admin_sessions(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let sessions = state.machine.recent_sessions(query.limit).await?;
    Ok(Json(sessions.into_iter().map(SessionSummary::from).collect()))
}

/// POST /v1/admin/reset
pub async fn post_admin_reset(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.machine.reset_all().await?;
    Ok(Json(serde_json::json!({ "status": "reset" })))
}

/// GET /health — unauthenticated probe.
pub async fn get_health(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    state.machine.ping_storage().await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: "ok".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_defaults_consent_to_false() {
        let body: RegisterRequest =
            serde_json::from_str(r#"{"kiosk_id": 1, "name": "Ana", "phone": "5551234567"}"#)
                .unwrap();
        assert!(!body.consent);
        assert!(body.email.is_none());
    }

    #[test]
    fn verify_response_omits_absent_attempts() {
        let json = serde_json::to_string(&VerifyResponse {
            outcome: VerifyOutcome::Verified,
            attempts_remaining: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"outcome":"verified"}"#);

        let json = serde_json::to_string(&VerifyResponse {
            outcome: VerifyOutcome::Invalid,
            attempts_remaining: Some(3),
        })
        .unwrap();
        assert!(json.contains("\"attempts_remaining\":3"));
    }

    #[test]
    fn session_summary_drops_photo_and_code() {
        let session = Session {
            id: "s-1".to_string(),
            kiosk_id: 2,
            guest_name: "Ana".to_string(),
            guest_phone: "15551234567".to_string(),
            guest_email: None,
            consent: true,
            state: SessionState::ReviewPending,
            verification_code: Some("123456".to_string()),
            code_expires_at: None,
            verification_attempts: 1,
            photo: Some(vec![0xFF]),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:01:00.000Z".to_string(),
        };
        let summary = SessionSummary::from(session);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("123456"));
        assert!(!json.contains("photo"));
        assert!(json.contains("review_pending"));
    }
}
