use auth::prelude::AuthService;
use storage::EventService;

/// Application state shared across all handlers
pub struct AppState {
    pub auth_service: AuthService,
    pub event_service: EventService,
}

impl AppState {
    pub fn new(auth_service: AuthService, event_service: EventService) -> Self {
        Self {
            auth_service,
            event_service,
        }
    }
}
