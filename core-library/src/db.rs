//! # Database
//!
//! Opens the channel studio SQLite database and applies the embedded
//! migrations (`migrations/`). Every pool handed out by this module is
//! migrated and ready for [`SqliteRecordStore`](crate::SqliteRecordStore).
//!
//! `:memory:` opens a private in-memory database shared by all connections of
//! the pool, which is what the tests use through [`create_test_pool`].

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Where the database lives and how many connections may be open to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// A database file, created on first open. `:memory:` maps to
    /// [`DatabaseConfig::in_memory`].
    pub fn new(database_path: impl AsRef<Path>) -> Self {
        let path = database_path.as_ref();
        if path == Path::new(":memory:") {
            return Self::in_memory();
        }

        Self {
            database_url: format!("sqlite:{}", path.display()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            database_url: IN_MEMORY_URL.to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_URL
    }
}

/// Opens the pool and runs pending migrations.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(database_url = %config.database_url, "Opening channel studio database");

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(LibraryError::Database)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open database");
            LibraryError::Database(e)
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    Ok(pool)
}

/// Migrated in-memory pool for tests.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}
