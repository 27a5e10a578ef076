//! Authenticated principal extraction.
//!
//! Flow Overview: read the session header, resolve it through the credential
//! manager, and hand downstream handlers the owner's public identity.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Response},
};

use super::session::extract_session_token;
use crate::credentials::{AuthError, CredentialManager, PublicIdentity};

/// Authenticated user context derived from the session header.
#[derive(Clone, Debug)]
pub struct Principal {
    pub identity: PublicIdentity,
}

/// Resolve the request's session into a principal.
///
/// # Errors
/// `Unauthenticated`/`InvalidSession` (401) when no valid session is attached.
pub async fn ensure_authenticated(
    headers: &HeaderMap,
    manager: &CredentialManager,
) -> Result<Principal, AuthError> {
    let token = extract_session_token(headers);
    let identity = manager.validate_session(token.as_deref()).await?;
    Ok(Principal { identity })
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let manager = parts
            .extensions
            .get::<CredentialManager>()
            .cloned()
            .ok_or_else(|| {
                AuthError::Internal(anyhow::anyhow!("credential manager extension missing"))
                    .into_response()
            })?;

        ensure_authenticated(&parts.headers, &manager)
            .await
            .map_err(IntoResponse::into_response)
    }
}
