use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::store::StubStore;
use crate::errors::StubError;
use crate::models::{SendAck, SendRequest};

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET `/messages/conversations`: summaries for the caller, unordered
pub async fn list_conversations_handler(
    headers: HeaderMap,
    State(store): State<StubStore>,
) -> Response {
    match caller(&headers) {
        Ok(me) => Json(store.conversations(&me).await).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/messages/chat/{listing_id}/{receiver_id}`: one thread plus the other user
pub async fn chat_handler(
    Path((listing_id, receiver_id)): Path<(String, String)>,
    headers: HeaderMap,
    State(store): State<StubStore>,
) -> Response {
    let me = match caller(&headers) {
        Ok(me) => me,
        Err(e) => return error_response(&e),
    };
    match store.thread(&me, &listing_id, &receiver_id).await {
        Ok(thread) => Json(thread).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/messages/send`: acknowledges without returning a message id
pub async fn send_handler(
    headers: HeaderMap,
    State(store): State<StubStore>,
    Json(request): Json<SendRequest>,
) -> Response {
    let me = match caller(&headers) {
        Ok(me) => me,
        Err(e) => return error_response(&e),
    };
    match store.send(&me, request).await {
        Ok(()) => Json(SendAck { status: Some("sent".to_string()) }).into_response(),
        Err(e) => error_response(&e),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// The bearer token is taken to be the caller's user id.
fn caller(headers: &HeaderMap) -> Result<String, StubError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(StubError::Unauthenticated)
}

fn error_response(err: &StubError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::UNAUTHORIZED
    };
    warn!("Rejecting request with {status}: {err}");
    (status, err.to_string()).into_response()
}
