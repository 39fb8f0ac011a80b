// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete booth pipeline.
//!
//! Each test drives the real axum router over an isolated in-memory
//! SQLite database with the local delivery channel writing into a temp
//! directory. Tests are independent and order-insensitive.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use booth_delivery::{local::LocalDelivery, Dispatcher};
use booth_gateway::{router, AppState};
use booth_session::{SessionStateMachine, VerificationEngine};
use booth_storage::{Database, DeliveryLog, KioskLeasePool, SessionStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const MAX_PHOTO_BYTES: usize = 4 * 1024 * 1024;

/// Minimal valid JPEG payload (magic bytes plus filler).
fn jpeg_bytes() -> Vec<u8> {
    let mut photo = vec![0xFF, 0xD8, 0xFF, 0xE0];
    photo.extend_from_slice(&[0x00; 64]);
    photo
}

async fn harness() -> (Router, TempDir) {
    let uploads = TempDir::new().unwrap();
    let db = Database::open_in_memory().await.unwrap();

    let store = SessionStore::new(db.clone());
    let pool = KioskLeasePool::open(db.clone(), 3, 1800, &Default::default())
        .await
        .unwrap();
    let log = DeliveryLog::new(db);

    let dispatcher = Dispatcher::new(Box::new(LocalDelivery::new(uploads.path())));
    let engine = VerificationEngine::new(120, 5);

    let machine = Arc::new(SessionStateMachine::new(
        store, pool, log, dispatcher, engine,
    ));
    let app = router(AppState {
        machine,
        max_photo_bytes: MAX_PHOTO_BYTES,
    });
    (app, uploads)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Registers a guest on `kiosk_id` and returns (session_id, verification_code).
async fn register(app: &Router, kiosk_id: u16, phone: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/v1/register",
        Some(json!({
            "kiosk_id": kiosk_id,
            "name": "Ana Torres",
            "phone": phone,
            "email": "ana@example.com",
            "consent": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    (
        body["session_id"].as_str().unwrap().to_string(),
        body["verification_code"].as_str().unwrap().to_string(),
    )
}

// ---- Full guest journey ----

#[tokio::test]
async fn full_journey_register_verify_photo_keep() {
    let (app, uploads) = harness().await;

    let (session_id, code) = register(&app, 1, "5551230001").await;

    // Kiosk shows the one-time code screen.
    let (status, display) = send(&app, "GET", "/v1/kiosks/1/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(display["display"], "verification_code");
    assert_eq!(display["code"], code);

    // Guest types the code from the kiosk.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/verify",
        Some(json!({ "session_id": session_id, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "verified");

    // Kiosk uploads the capture.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/photos",
        Some(json!({
            "session_id": session_id,
            "photo_base64": BASE64.encode(jpeg_bytes()),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "review_pending");

    // Phone polls the photo for review.
    let (status, body) = send(&app, "GET", &format!("/v1/photos/{session_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    let round_trip = BASE64
        .decode(body["photo_base64"].as_str().unwrap())
        .unwrap();
    assert_eq!(round_trip, jpeg_bytes());

    // Guest keeps the photo; local delivery lands in the upload dir.
    let (status, body) = send(&app, "POST", &format!("/v1/photos/{session_id}/keep"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "completed");
    assert_eq!(body["delivery"]["outcome"], "sent");

    let log_path = uploads.path().join("photo_log.txt");
    let log = std::fs::read_to_string(log_path).unwrap();
    assert!(log.contains(&session_id));

    // Kiosk is free again.
    let (status, display) = send(&app, "GET", "/v1/kiosks/1/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(display["display"], "idle");

    // Counters reflect the journey.
    let (status, stats) = send(&app, "GET", "/v1/admin/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_created"], 1);
    assert_eq!(stats["total_verified"], 1);
    assert_eq!(stats["total_photos_taken"], 1);
    assert_eq!(stats["deliveries_sent"], 1);
    assert_eq!(stats["live_sessions"], 0);
}

// ---- Registration validation ----

#[tokio::test]
async fn register_rejects_bad_phone() {
    let (app, _uploads) = harness().await;
    let (status, body) = send(
        &app,
        "POST",
        "/v1/register",
        Some(json!({
            "kiosk_id": 1,
            "name": "Ana",
            "phone": "12 34",
            "consent": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("phone"));
}

#[tokio::test]
async fn register_requires_consent() {
    let (app, _uploads) = harness().await;
    let (status, _) = send(
        &app,
        "POST",
        "/v1/register",
        Some(json!({
            "kiosk_id": 1,
            "name": "Ana",
            "phone": "5551230001",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_kiosk_outside_pool() {
    let (app, _uploads) = harness().await;
    for kiosk_id in [0u16, 4] {
        let (status, _) = send(
            &app,
            "POST",
            "/v1/register",
            Some(json!({
                "kiosk_id": kiosk_id,
                "name": "Ana",
                "phone": "5551230001",
                "consent": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "kiosk {kiosk_id}");
    }
}

// ---- Kiosk contention ----

#[tokio::test]
async fn busy_kiosk_returns_conflict_with_remaining_secs() {
    let (app, _uploads) = harness().await;
    let _first = register(&app, 2, "5551230001").await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/register",
        Some(json!({
            "kiosk_id": 2,
            "name": "Ben",
            "phone": "5551230002",
            "consent": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let remaining = body["remaining_secs"].as_u64().unwrap();
    assert!(remaining > 0 && remaining <= 1800, "remaining {remaining}");

    // A different kiosk is still available.
    register(&app, 3, "5551230003").await;
}

// ---- Verification ----

#[tokio::test]
async fn verify_rejects_malformed_code_without_burning_attempt() {
    let (app, _uploads) = harness().await;
    let (session_id, code) = register(&app, 1, "5551230001").await;

    for bad in ["12345", "1234567", "12a456", ""] {
        let (status, _) = send(
            &app,
            "POST",
            "/v1/verify",
            Some(json!({ "session_id": session_id, "code": bad })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "code {bad:?}");
    }

    // The real code still verifies: malformed input never reached the counter.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/verify",
        Some(json!({ "session_id": session_id, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "verified");
}

#[tokio::test]
async fn wrong_code_reports_attempts_remaining() {
    let (app, _uploads) = harness().await;
    let (session_id, code) = register(&app, 1, "5551230001").await;
    let wrong = if code == "000000" { "000001" } else { "000000" };

    let (status, body) = send(
        &app,
        "POST",
        "/v1/verify",
        Some(json!({ "session_id": session_id, "code": wrong })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "invalid");
    assert_eq!(body["attempts_remaining"], 4);
}

#[tokio::test]
async fn verify_unknown_session_is_not_found() {
    let (app, _uploads) = harness().await;
    let (status, _) = send(
        &app,
        "POST",
        "/v1/verify",
        Some(json!({ "session_id": "no-such-session", "code": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---- Photo upload guards ----

#[tokio::test]
async fn photo_upload_rejects_non_image_payload() {
    let (app, _uploads) = harness().await;
    let (session_id, code) = register(&app, 1, "5551230001").await;
    send(
        &app,
        "POST",
        "/v1/verify",
        Some(json!({ "session_id": session_id, "code": code })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/photos",
        Some(json!({
            "session_id": session_id,
            "photo_base64": BASE64.encode(b"definitely not an image"),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn photo_upload_before_verification_is_conflict() {
    let (app, _uploads) = harness().await;
    let (session_id, _code) = register(&app, 1, "5551230001").await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/photos",
        Some(json!({
            "session_id": session_id,
            "photo_base64": BASE64.encode(jpeg_bytes()),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---- Discard path ----

#[tokio::test]
async fn discard_frees_kiosk_and_skips_delivery() {
    let (app, uploads) = harness().await;
    let (session_id, code) = register(&app, 1, "5551230001").await;
    send(
        &app,
        "POST",
        "/v1/verify",
        Some(json!({ "session_id": session_id, "code": code })),
    )
    .await;
    send(
        &app,
        "POST",
        "/v1/photos",
        Some(json!({
            "session_id": session_id,
            "photo_base64": BASE64.encode(jpeg_bytes()),
        })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/photos/{session_id}/discard"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "discarded");

    // Nothing was delivered and the kiosk is free for the next guest.
    assert!(!uploads.path().join("photo_log.txt").exists());
    register(&app, 1, "5551230002").await;
}

// ---- Admin surface ----

#[tokio::test]
async fn admin_sessions_hide_photo_and_code() {
    let (app, _uploads) = harness().await;
    let (_session_id, _code) = register(&app, 1, "5551230001").await;

    let (status, body) = send(&app, "GET", "/v1/admin/sessions?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].get("photo").is_none());
    assert!(sessions[0].get("verification_code").is_none());
}

#[tokio::test]
async fn admin_reset_clears_sessions_leases_and_counters() {
    let (app, _uploads) = harness().await;
    register(&app, 1, "5551230001").await;

    let (status, _) = send(&app, "POST", "/v1/admin/reset", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(&app, "GET", "/v1/admin/stats", None).await;
    assert_eq!(stats["total_created"], 0);
    assert_eq!(stats["live_sessions"], 0);
    assert_eq!(stats["kiosks_in_use"], 0);

    // Kiosk 1 is usable again right away.
    register(&app, 1, "5551230002").await;
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _uploads) = harness().await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn kiosk_board_lists_every_kiosk() {
    let (app, _uploads) = harness().await;
    register(&app, 2, "5551230001").await;

    let (status, body) = send(&app, "GET", "/v1/kiosks", None).await;
    assert_eq!(status, StatusCode::OK);
    let leases = body.as_array().unwrap();
    assert_eq!(leases.len(), 3);
    let kiosk2 = leases
        .iter()
        .find(|l| l["kiosk_id"] == 2)
        .expect("kiosk 2 in board");
    assert_eq!(kiosk2["status"], "in_use");
}
