use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{auth_handlers, event_handlers, middleware as auth_middleware, user_handlers, AppState};

/// Build the full application router.
///
/// Every route is served both at the root and under `/api`.
pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let routes = routes(state.clone());

    Router::new()
        .route("/", get(|| async { "Ticketing API running" }))
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(timeout_layer(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/refresh", post(auth_handlers::refresh))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/universities", get(event_handlers::list_universities));

    // Protected routes (require a valid access token)
    let protected_routes = Router::new()
        .route("/auth/logout-all", post(auth_handlers::logout_all))
        .route("/users/data", get(user_handlers::current_user))
        .route("/users/data/{id}", get(user_handlers::user_by_id))
        .route(
            "/events",
            get(event_handlers::list_events).post(event_handlers::create_event),
        )
        .route("/events/", post(event_handlers::create_event))
        .route("/events/categories", get(event_handlers::list_categories))
        .route("/events/{id}", get(event_handlers::get_event))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth_middleware::require_auth,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Requests running past `request_timeout` are answered with 408
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}
