mod seed;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use api::AppState;
use auth::{
    AuthService, CredentialStore, HashCost, MemoryStore, RefreshTokenStore, SessionSettings,
    SqliteStore,
};
use storage::{EventService, MemoryEventStore};
use ticketing_core::{telemetry, AppConfig, AuthConfig, DatabaseConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, overrides) = AppConfig::load_with_env().context("failed to load configuration")?;

    telemetry::init(&config.log.filter).context("failed to initialise tracing")?;
    for key in &overrides {
        info!(key = %key, "config overridden from environment");
    }

    let (users, refresh_tokens) = open_stores(&config.database).await?;
    let auth_service = AuthService::new(users, refresh_tokens, session_settings(&config.auth))
        .context("invalid auth configuration")?;
    let event_service = EventService::new(Arc::new(MemoryEventStore::new()));

    seed::seed(&config.seed, &auth_service, &event_service).await?;

    if config.auth.refresh_sweep_interval_seconds > 0 {
        spawn_refresh_token_sweep(
            auth_service.clone(),
            Duration::from_secs(config.auth.refresh_sweep_interval_seconds),
        );
    }

    let state = Arc::new(AppState::new(auth_service, event_service));
    let app = api::router(
        state,
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn open_stores(
    config: &DatabaseConfig,
) -> Result<(Arc<dyn CredentialStore>, Arc<dyn RefreshTokenStore>)> {
    if config.is_memory() {
        warn!("using in-memory stores; sessions and users are lost on restart");
        let store = Arc::new(MemoryStore::new());
        let users: Arc<dyn CredentialStore> = store.clone();
        let refresh_tokens: Arc<dyn RefreshTokenStore> = store;
        return Ok((users, refresh_tokens));
    }

    let store = Arc::new(
        SqliteStore::new(&config.url, config.max_connections)
            .await
            .with_context(|| format!("failed to open database {}", config.url))?,
    );
    let users: Arc<dyn CredentialStore> = store.clone();
    let refresh_tokens: Arc<dyn RefreshTokenStore> = store;
    Ok((users, refresh_tokens))
}

fn session_settings(config: &AuthConfig) -> SessionSettings {
    SessionSettings {
        access_token_ttl: chrono::Duration::seconds(config.access_token_ttl_seconds),
        refresh_token_ttl: chrono::Duration::seconds(config.refresh_token_ttl_seconds),
        clock_skew_seconds: config.clock_skew_seconds,
        store_timeout: Duration::from_millis(config.store_timeout_ms),
        hash_cost: HashCost {
            memory_kib: config.hash_memory_kib,
            iterations: config.hash_iterations,
            parallelism: config.hash_parallelism,
        },
        ..SessionSettings::new(config.jwt_secret.clone())
    }
}

fn spawn_refresh_token_sweep(auth_service: AuthService, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = auth_service.purge_expired_refresh_tokens().await {
                warn!(error = %e, "refresh token sweep failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
