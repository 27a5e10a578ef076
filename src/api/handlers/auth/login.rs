use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use secrecy::SecretString;
use tracing::instrument;

use super::error::missing_payload;
use super::types::{ErrorResponse, LoginRequest, LoginResponse};
use crate::credentials::CredentialManager;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Validation error or invalid email/password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(manager, payload))]
pub async fn login(
    manager: Extension<CredentialManager>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let password = request.password.map(SecretString::from);
    match manager
        .authenticate(request.email.as_deref(), password.as_ref())
        .await
    {
        Ok(session_id) => (StatusCode::OK, Json(LoginResponse { session_id })).into_response(),
        Err(err) => err.into_response(),
    }
}
