use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "TICKETING";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `memory` or a `sqlite:` URL
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_seconds: i64,
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_seconds: i64,
    #[serde(default)]
    pub clock_skew_seconds: u64,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
    /// 0 disables the sweep
    #[serde(default = "default_sweep_interval")]
    pub refresh_sweep_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Reference data created at startup when missing
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub universities: Vec<String>,
    pub admin_phone: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_database_url() -> String {
    "memory".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_token_ttl() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_ttl() -> i64 {
    30 * 24 * 3600
}

fn default_store_timeout_ms() -> u64 {
    5000
}

fn default_hash_memory_kib() -> u32 {
    19456
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_hash_parallelism() -> u32 {
    1
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_filter() -> String {
    "info,tower_http=info,sqlx=warn".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from ticketing.toml in the current directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file("ticketing.toml")
    }

    /// Load configuration with environment variable overrides
    ///
    /// Environment variables are prefixed with `TICKETING_`, and nested keys are
    /// separated by a double underscore, e.g. `TICKETING_AUTH__JWT_SECRET`,
    /// `TICKETING_SERVER__PORT`. List values (`seed.*`) are comma separated.
    ///
    /// Returns the config and the keys overridden from the environment
    pub fn load_with_env() -> Result<(Self, Vec<String>), ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("ticketing").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("seed.categories")
                    .with_list_parse_key("seed.universities"),
            )
            .build()?;

        let overrides = env_overrides(std::env::vars());

        let app_config = config.try_deserialize()?;
        Ok((app_config, overrides))
    }
}

/// Config keys set by `TICKETING_` variables
fn env_overrides(vars: impl Iterator<Item = (String, String)>) -> Vec<String> {
    let prefix = format!("{}_", ENV_PREFIX);
    let mut keys: Vec<String> = vars
        .filter_map(|(name, _)| {
            name.strip_prefix(&prefix)
                .map(|key| key.to_lowercase().replace("__", "."))
        })
        .collect();
    keys.sort();
    keys
}
