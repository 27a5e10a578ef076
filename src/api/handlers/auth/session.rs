//! Session endpoints for header and bearer auth.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use tracing::{error, instrument};

use super::SESSION_HEADER;
use super::types::ErrorResponse;
use crate::credentials::{CredentialManager, PublicIdentity};

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    params(
        ("session-id" = Option<String>, Header, description = "Session identifier returned by login")
    ),
    responses(
        (status = 200, description = "Session is active", body = PublicIdentity),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn session(headers: HeaderMap, manager: Extension<CredentialManager>) -> impl IntoResponse {
    let token = extract_session_token(&headers);
    match manager.validate_session(token.as_deref()).await {
        Ok(identity) => (StatusCode::OK, Json(identity)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    params(
        ("session-id" = Option<String>, Header, description = "Session identifier to revoke")
    ),
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(headers: HeaderMap, manager: Extension<CredentialManager>) -> impl IntoResponse {
    let token = extract_session_token(&headers);
    if let Err(err) = manager.revoke_session(token.as_deref()).await {
        error!("Failed to delete session: {err}");
    }

    // Always 204, even if the session record was missing.
    StatusCode::NO_CONTENT
}

/// Read the session id from the `session-id` header, falling back to a bearer token.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        return Some(token.to_string());
    }
    extract_bearer_token(headers)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
