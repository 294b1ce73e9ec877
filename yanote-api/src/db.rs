//! PostgreSQL Store Module
//!
//! Connection pooling via deadpool-postgres and a [`PgStore`] that
//! implements the storage traits with plain SQL. The schema is created on
//! startup by [`PgStore::migrate`].
//!
//! Slug and username uniqueness are enforced by unique constraints, so a
//! concurrent duplicate insert surfaces as `23505` and is mapped back to the
//! matching [`StorageError`].

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;
use yanote_core::{
    EntityIdType, EntityType, Note, NoteId, StorageError, User, UserId, YanoteResult,
};
use yanote_storage::{NoteStore, UserStore};

const NOTES_SLUG_CONSTRAINT: &str = "notes_slug_key";
const USERS_USERNAME_CONSTRAINT: &str = "users_username_key";

/// Schema, applied idempotently on startup.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id       UUID PRIMARY KEY,
    username      VARCHAR(150) NOT NULL CONSTRAINT users_username_key UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    note_id    UUID PRIMARY KEY,
    seq        BIGSERIAL NOT NULL,
    title      VARCHAR(100) NOT NULL,
    text       TEXT NOT NULL,
    slug       VARCHAR(100) NOT NULL CONSTRAINT notes_slug_key UNIQUE,
    author_id  UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS notes_author_seq_idx ON notes (author_id, seq);
"#;

const NOTE_COLUMNS: &str = "note_id, title, text, slug, author_id, created_at, updated_at";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait timeout when checking out a connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "yanote".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from `YANOTE_DB_*` variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("YANOTE_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("YANOTE_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("YANOTE_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("YANOTE_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("YANOTE_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("YANOTE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("YANOTE_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_config.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_config);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// [`NoteStore`] and [`UserStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("pool_size", &self.pool_size())
            .finish()
    }
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Current pool size, for health reporting.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    async fn conn(&self) -> YanoteResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            StorageError::Backend {
                reason: format!("connection pool: {}", e),
            }
            .into()
        })
    }
}

/// Storage error for a `23505` raised by `constraint`.
fn unique_violation(constraint: Option<&str>, value: &str) -> StorageError {
    match constraint {
        Some(NOTES_SLUG_CONSTRAINT) => StorageError::SlugTaken {
            slug: value.to_string(),
        },
        Some(USERS_USERNAME_CONSTRAINT) => StorageError::UsernameTaken {
            username: value.to_string(),
        },
        other => StorageError::Backend {
            reason: format!("unique violation on {}", other.unwrap_or("unknown constraint")),
        },
    }
}

/// Map a driver error to a storage error. `value` is the unique key the
/// statement was writing, if any.
fn storage_error(err: tokio_postgres::Error, value: &str) -> StorageError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let constraint = err.as_db_error().and_then(|db| db.constraint());
        return unique_violation(constraint, value);
    }
    tracing::error!("Database error: {:?}", err);
    StorageError::Backend {
        reason: err.to_string(),
    }
}

fn backend(err: tokio_postgres::Error) -> yanote_core::YanoteError {
    storage_error(err, "").into()
}

fn note_from_row(row: &Row) -> Result<Note, tokio_postgres::Error> {
    Ok(Note {
        note_id: NoteId::new(row.try_get::<_, Uuid>("note_id")?),
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        slug: row.try_get("slug")?,
        author_id: UserId::new(row.try_get::<_, Uuid>("author_id")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn user_from_row(row: &Row) -> Result<User, tokio_postgres::Error> {
    Ok(User {
        user_id: UserId::new(row.try_get::<_, Uuid>("user_id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl NoteStore for PgStore {
    async fn note_insert(&self, note: &Note) -> YanoteResult<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO notes (note_id, title, text, slug, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[
                &note.note_id.as_uuid(),
                &note.title,
                &note.text,
                &note.slug,
                &note.author_id.as_uuid(),
                &note.created_at,
                &note.updated_at,
            ],
        )
        .await
        .map_err(|e| storage_error(e, &note.slug))?;
        Ok(())
    }

    async fn note_get_by_slug(&self, slug: &str) -> YanoteResult<Option<Note>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {} FROM notes WHERE slug = $1", NOTE_COLUMNS),
                &[&slug],
            )
            .await
            .map_err(backend)?;
        row.as_ref().map(note_from_row).transpose().map_err(backend)
    }

    async fn note_list_by_author(&self, author_id: UserId) -> YanoteResult<Vec<Note>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM notes WHERE author_id = $1 ORDER BY seq",
                    NOTE_COLUMNS
                ),
                &[&author_id.as_uuid()],
            )
            .await
            .map_err(backend)?;
        rows.iter()
            .map(note_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)
    }

    async fn note_update(&self, note: &Note) -> YanoteResult<()> {
        let conn = self.conn().await?;
        let updated = conn
            .execute(
                "UPDATE notes SET title = $2, text = $3, slug = $4, updated_at = $5 \
                 WHERE note_id = $1",
                &[
                    &note.note_id.as_uuid(),
                    &note.title,
                    &note.text,
                    &note.slug,
                    &note.updated_at,
                ],
            )
            .await
            .map_err(|e| storage_error(e, &note.slug))?;
        if updated == 0 {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Note,
                id: note.note_id.as_uuid(),
            }
            .into());
        }
        Ok(())
    }

    async fn note_delete(&self, id: NoteId) -> YanoteResult<()> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM notes WHERE note_id = $1", &[&id.as_uuid()])
            .await
            .map_err(backend)?;
        if deleted == 0 {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Note,
                id: id.as_uuid(),
            }
            .into());
        }
        Ok(())
    }

    async fn note_slug_exists(&self, slug: &str, exclude: Option<NoteId>) -> YanoteResult<bool> {
        let conn = self.conn().await?;
        let exclude = exclude.map(|id| id.as_uuid());
        let row = conn
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM notes WHERE slug = $1 \
                 AND ($2::uuid IS NULL OR note_id <> $2))",
                &[&slug, &exclude],
            )
            .await
            .map_err(backend)?;
        row.try_get(0).map_err(backend)
    }

    async fn note_count(&self) -> YanoteResult<u64> {
        let conn = self.conn().await?;
        let row = conn
            .query_one("SELECT COUNT(*) FROM notes", &[])
            .await
            .map_err(backend)?;
        let count: i64 = row.try_get(0).map_err(backend)?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn user_insert(&self, user: &User) -> YanoteResult<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO users (user_id, username, password_hash, created_at) \
             VALUES ($1, $2, $3, $4)",
            &[
                &user.user_id.as_uuid(),
                &user.username,
                &user.password_hash,
                &user.created_at,
            ],
        )
        .await
        .map_err(|e| storage_error(e, &user.username))?;
        Ok(())
    }

    async fn user_get(&self, id: UserId) -> YanoteResult<Option<User>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT user_id, username, password_hash, created_at FROM users \
                 WHERE user_id = $1",
                &[&id.as_uuid()],
            )
            .await
            .map_err(backend)?;
        row.as_ref().map(user_from_row).transpose().map_err(backend)
    }

    async fn user_get_by_username(&self, username: &str) -> YanoteResult<Option<User>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT user_id, username, password_hash, created_at FROM users \
                 WHERE username = $1",
                &[&username],
            )
            .await
            .map_err(backend)?;
        row.as_ref().map(user_from_row).transpose().map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "yanote");
        assert_eq!(config.max_size, 16);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_unique_violation_on_slug() {
        assert_eq!(
            unique_violation(Some("notes_slug_key"), "address_slug"),
            StorageError::SlugTaken {
                slug: "address_slug".to_string()
            }
        );
    }

    #[test]
    fn test_unique_violation_on_username() {
        assert_eq!(
            unique_violation(Some("users_username_key"), "Лёва Толстый"),
            StorageError::UsernameTaken {
                username: "Лёва Толстый".to_string()
            }
        );
    }

    #[test]
    fn test_unique_violation_on_unknown_constraint() {
        assert!(matches!(
            unique_violation(None, "x"),
            StorageError::Backend { .. }
        ));
    }

    #[test]
    fn test_schema_names_constraints() {
        assert!(SCHEMA.contains(NOTES_SLUG_CONSTRAINT));
        assert!(SCHEMA.contains(USERS_USERNAME_CONSTRAINT));
    }

    #[tokio::test]
    async fn test_pool_creation_is_lazy() -> ApiResult<()> {
        // No connection is attempted until the first checkout.
        let store = PgStore::from_config(&DbConfig::default())?;
        assert_eq!(store.pool_size(), 0);
        Ok(())
    }
}
