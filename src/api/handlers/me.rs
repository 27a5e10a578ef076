//! Authenticated self-service endpoint.

use axum::{Json, http::StatusCode, response::IntoResponse};

use super::auth::{principal::Principal, types::ErrorResponse};
use crate::credentials::PublicIdentity;

#[utoipa::path(
    get,
    path = "/v1/me",
    params(
        ("session-id" = String, Header, description = "Session identifier returned by login")
    ),
    responses(
        (status = 200, description = "Return the authenticated identity.", body = PublicIdentity),
        (status = 401, description = "Missing or invalid session.", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn get_me(principal: Principal) -> impl IntoResponse {
    (StatusCode::OK, Json(principal.identity))
}
