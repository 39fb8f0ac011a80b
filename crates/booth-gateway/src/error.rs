// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error-to-HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use booth_core::BoothError;
use serde::Serialize;

/// JSON error body. `remaining_secs` is present only for kiosk-busy
/// responses so the phone UI can show a countdown.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<i64>,
}

/// Wrapper so handlers can `?` domain errors straight into responses.
#[derive(Debug)]
pub struct ApiError(pub BoothError);

impl From<BoothError> for ApiError {
    fn from(e: BoothError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, remaining_secs) = match &self.0 {
            BoothError::Validation { .. } | BoothError::InvalidKioskId(_) => {
                (StatusCode::BAD_REQUEST, None)
            }
            BoothError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            BoothError::LeaseDenied { remaining_secs, .. } => {
                (StatusCode::CONFLICT, Some(*remaining_secs))
            }
            BoothError::Conflict(_) => (StatusCode::CONFLICT, None),
            BoothError::Storage { .. }
            | BoothError::Delivery { .. }
            | BoothError::Config(_)
            | BoothError::Internal(_) => {
                tracing::error!(error = %self.0, "internal error serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ErrorBody {
            error: self.0.to_string(),
            remaining_secs,
        };
        (status, Json(body)).into_response()
    }
}
