use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use ticketing_core::ObjectId;

use crate::{error::ApiError, middleware::AuthUser, AppState};

/// GET /users/data - Profile of the caller
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.auth_service.find_user(identity.user_id).await?;
    Ok(Json(profile))
}

/// GET /users/data/{id} - Profile of any user
pub async fn user_by_id(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ObjectId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let profile = state.auth_service.find_user(id).await?;
    Ok(Json(profile))
}
