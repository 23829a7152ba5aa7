pub mod router;
pub mod state;
pub mod auth_handlers;
pub mod user_handlers;
pub mod event_handlers;
pub mod error;
pub mod middleware;

pub use error::{ApiError, ErrorResponse};
pub use router::router;
pub use state::AppState;
