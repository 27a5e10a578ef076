use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use secrecy::SecretString;
use tracing::instrument;

use super::error::missing_payload;
use super::types::{ErrorResponse, RegisterRequest, RegisterResponse};
use crate::credentials::CredentialManager;

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Credential created", body = RegisterResponse),
        (status = 400, description = "Validation error or email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(manager, payload))]
pub async fn register(
    manager: Extension<CredentialManager>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    let password = request.password.map(SecretString::from);
    match manager
        .register(
            request.name.as_deref(),
            request.email.as_deref(),
            password.as_ref(),
        )
        .await
    {
        Ok(user_id) => (StatusCode::CREATED, Json(RegisterResponse { user_id })).into_response(),
        Err(err) => err.into_response(),
    }
}
