//! # tally-store
//!
//! SQLite-backed implementation of the Tally user and task stores.
//!
//! Split into focused submodules:
//! - `users` — user lookup, lazy creation, and state persistence
//! - `tasks` — task CRUD and the global delete-by-title

mod tasks;
mod users;


use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tally_core::{
    config::{shellexpand, StoreConfig},
    error::TallyError,
};
use tracing::info;

/// Persistent store backed by SQLite. Implements both [`UserStore`] and
/// [`TaskStore`].
///
/// [`UserStore`]: tally_core::traits::UserStore
/// [`TaskStore`]: tally_core::traits::TaskStore
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store, running migrations on first use.
    ///
    /// A `db_path` of `:memory:` opens an in-memory database on a single
    /// pooled connection (each SQLite connection gets its own `:memory:`
    /// database, so the pool must not grow).
    pub async fn new(config: &StoreConfig) -> Result<Self, TallyError> {
        if config.db_path == ":memory:" {
            let opts = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| TallyError::Store(format!("invalid db path: {e}")))?;
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(opts)
                .await
                .map_err(|e| TallyError::Store(format!("failed to connect to sqlite: {e}")))?;
            Self::run_migrations(&pool).await?;
            return Ok(Self { pool });
        }

        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TallyError::Store(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| TallyError::Store(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| TallyError::Store(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Total user count (for `tally status`).
    pub async fn count_users(&self) -> Result<i64, TallyError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM app_users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TallyError::Store(format!("count users failed: {e}")))?;
        Ok(count)
    }

    /// Open task count across all users (for `tally status`).
    pub async fn count_open_tasks(&self) -> Result<i64, TallyError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE completed = 0")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TallyError::Store(format!("count tasks failed: {e}")))?;
        Ok(count)
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), TallyError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| TallyError::Store(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_init", include_str!("../migrations/001_init.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        TallyError::Store(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| TallyError::Store(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| TallyError::Store(format!("failed to record migration {name}: {e}")))?;
        }
        Ok(())
    }
}

/// Parse an RFC 3339 timestamp from a TEXT column.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TallyError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TallyError::Store(format!("bad timestamp '{s}': {e}")))
}
