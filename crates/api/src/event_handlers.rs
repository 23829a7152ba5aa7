use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use ticketing_core::ObjectId;
use tracing::warn;

use crate::{
    error::ApiError,
    middleware::{require_any_role, AuthUser, EVENT_MANAGERS},
    AppState,
};
use storage::NewEvent;

/// POST /events - Create an event (organizers and admins)
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // Permission comes before the body is looked at
    require_any_role(&identity, EVENT_MANAGERS)?;
    let Json(input) = payload?;

    let event = state
        .event_service
        .create_event(identity.user_id, input)
        .await?;

    if let Err(e) = state
        .auth_service
        .link_event(identity.user_id, event.id)
        .await
    {
        // The event exists either way; the profile link is best effort
        warn!(
            user_id = %identity.user_id,
            event_id = %event.id,
            error = %e,
            "failed to link event to organizer"
        );
    }

    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.event_service.list_events().await?))
}

/// GET /events/{id}
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ObjectId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.event_service.get_event(id).await?))
}

/// GET /events/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.event_service.list_categories().await?))
}

/// GET /universities
pub async fn list_universities(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.event_service.list_universities().await?))
}
