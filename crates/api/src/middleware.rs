use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::{error::ApiError, AppState};
use auth::prelude::{Identity, Role};

/// Roles allowed to create events
pub const EVENT_MANAGERS: &[Role] = &[Role::Organizer, Role::Admin];

/// Extract and validate the access token from the Authorization header
pub fn extract_identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            debug!("missing or malformed Authorization header");
            ApiError::unauthorized()
        })?;

    Ok(state.auth_service.authorize(token)?)
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = extract_identity(&state, request.headers())?;

    // Store the identity in request extensions for handlers to access
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Fail with 403 unless the identity holds one of `roles`
pub fn require_any_role(identity: &Identity, roles: &[Role]) -> Result<(), ApiError> {
    if identity.has_any_role(roles) {
        Ok(())
    } else {
        debug!(user_id = %identity.user_id, role = %identity.role, "role not permitted");
        Err(ApiError::forbidden())
    }
}

/// Extractor for the authenticated caller
/// Use this in handlers that are protected by `require_auth`
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(AuthUser)
            .ok_or_else(ApiError::unauthorized)
    }
}
