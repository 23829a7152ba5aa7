pub mod config;
pub mod id;
pub mod telemetry;

pub use config::{AppConfig, AuthConfig, DatabaseConfig, LogConfig, SeedConfig, ServerConfig};
pub use id::{InvalidId, ObjectId};
