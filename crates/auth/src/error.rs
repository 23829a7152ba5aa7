use thiserror::Error;

/// Outcome classes of the session core.
///
/// `Unauthorized` and `NotFound` deliberately carry no detail: callers
/// must not be able to tell an unknown phone from a wrong password, or a
/// forged access token from an expired one.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Failures raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store operation `{0}` timed out")]
    Timeout(&'static str),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => AuthError::Conflict(format!("{} already exists", key)),
            other => AuthError::Unavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
