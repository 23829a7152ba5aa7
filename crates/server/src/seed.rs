use anyhow::{Context, Result};
use tracing::{info, warn};

use auth::{AuthError, AuthService, NewUser, Role};
use storage::EventService;
use ticketing_core::SeedConfig;

/// Create configured reference data and the bootstrap admin when missing
pub async fn seed(
    config: &SeedConfig,
    auth_service: &AuthService,
    event_service: &EventService,
) -> Result<()> {
    for title in &config.categories {
        event_service
            .ensure_category(title)
            .await
            .with_context(|| format!("failed to seed category '{}'", title))?;
    }
    for title in &config.universities {
        event_service
            .ensure_university(title)
            .await
            .with_context(|| format!("failed to seed university '{}'", title))?;
    }
    info!(
        categories = config.categories.len(),
        universities = config.universities.len(),
        "reference data ready"
    );

    match (&config.admin_phone, &config.admin_password) {
        (Some(phone), Some(password)) => seed_admin(auth_service, phone, password).await,
        (None, None) => Ok(()),
        _ => {
            warn!("seed.admin_phone and seed.admin_password must be set together; skipping admin");
            Ok(())
        }
    }
}

async fn seed_admin(auth_service: &AuthService, phone: &str, password: &str) -> Result<()> {
    let input = NewUser {
        phone: phone.to_string(),
        password: password.to_string(),
        first_name: "Admin".to_string(),
        last_name: "Admin".to_string(),
        university: None,
    };

    match auth_service.register_with_role(input, Role::Admin).await {
        Ok(profile) => {
            info!(user_id = %profile.id, "created admin account");
            Ok(())
        }
        Err(AuthError::Conflict(_)) => {
            info!("admin account already exists");
            Ok(())
        }
        Err(e) => Err(e).context("failed to create admin account"),
    }
}
