//! SQLite storage backend.
//!
//! Refresh token redemption is a single `DELETE ... RETURNING` statement,
//! so SQLite's write lock makes find-and-remove atomic across every
//! connection and process sharing the database file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use ticketing_core::ObjectId;
use tracing::info;

use super::{CredentialStore, RefreshTokenStore};
use crate::error::{StoreError, StoreResult};
use crate::model::{RefreshToken, Role, User};

/// SQLite-backed users and refresh tokens.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database and apply the schema.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://./ticketing.db` - File-based database
    pub async fn new(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `:memory:` is its own database, so keep exactly one alive
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.run_migrations().await?;
        info!(url = %database_url, "sqlite store ready");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> StoreResult<Self> {
        Self::new("sqlite::memory:", 1).await
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                phone TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                role TEXT NOT NULL,
                university TEXT,
                events TEXT NOT NULL DEFAULT '[]',
                purchases TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                issued_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_id ON refresh_tokens(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_expires_at ON refresh_tokens(expires_at)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn insert_error(err: sqlx::Error, key: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate(key.to_string());
        }
    }
    StoreError::Database(err)
}

fn parse_id(value: &str, column: &str) -> StoreResult<ObjectId> {
    value.parse::<ObjectId>().map_err(|e| StoreError::Corrupt(format!("{}: {}", column, e)))
}

fn parse_id_list(value: &str, column: &str) -> StoreResult<Vec<ObjectId>> {
    serde_json::from_str(value).map_err(|e| StoreError::Corrupt(format!("{}: {}", column, e)))
}

fn from_millis(value: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| StoreError::Corrupt(format!("{}: timestamp out of range", column)))
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    phone: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    university: Option<String>,
    events: String,
    purchases: String,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> StoreResult<User> {
        let role = Role::from_str(&self.role)
            .map_err(|_| StoreError::Corrupt(format!("role: {}", self.role)))?;
        let university = self
            .university
            .as_deref()
            .map(|u| parse_id(u, "university"))
            .transpose()?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Corrupt(format!("created_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(User {
            id: parse_id(&self.id, "id")?,
            phone: self.phone,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            university,
            events: parse_id_list(&self.events, "events")?,
            purchases: parse_id_list(&self.purchases, "purchases")?,
            created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RefreshTokenRow {
    token_hash: String,
    user_id: String,
    issued_at: i64,
    expires_at: i64,
}

impl RefreshTokenRow {
    fn into_token(self) -> StoreResult<RefreshToken> {
        Ok(RefreshToken {
            user_id: parse_id(&self.user_id, "user_id")?,
            issued_at: from_millis(self.issued_at, "issued_at")?,
            expires_at: from_millis(self.expires_at, "expires_at")?,
            token_hash: self.token_hash,
        })
    }
}

const USER_COLUMNS: &str =
    "id, phone, password_hash, first_name, last_name, role, university, events, purchases, created_at";

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn create(&self, user: &User) -> StoreResult<()> {
        let events = serde_json::to_string(&user.events)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let purchases = serde_json::to_string(&user.purchases)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, phone, password_hash, first_name, last_name, role, university, events, purchases, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.university.map(|u| u.to_string()))
        .bind(events)
        .bind(purchases)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, "phone"))?;

        Ok(())
    }

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE phone = ?",
            USER_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn add_event(&self, user_id: ObjectId, event_id: ObjectId) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET events = CASE
                WHEN EXISTS (SELECT 1 FROM json_each(users.events) WHERE json_each.value = ?1)
                THEN events
                ELSE json_insert(events, '$[#]', ?1)
            END
            WHERE id = ?2
            "#,
        )
        .bind(event_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RefreshTokenStore for SqliteStore {
    async fn insert(&self, token: &RefreshToken) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token_hash, user_id, issued_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token.token_hash)
        .bind(token.user_id.to_string())
        .bind(token.issued_at.timestamp_millis())
        .bind(token.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, "refresh token"))?;

        Ok(())
    }

    async fn take(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "DELETE FROM refresh_tokens WHERE token_hash = ? RETURNING token_hash, user_id, issued_at, expires_at",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RefreshTokenRow::into_token).transpose()
    }

    async fn delete(&self, token_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: ObjectId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
