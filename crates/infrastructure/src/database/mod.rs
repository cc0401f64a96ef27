pub mod dump;
pub mod migrations;
pub mod sqlite;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqlitePool};
use taskgenie_config::DatabaseConfig;
use taskgenie_errors::TaskGenieResult;
use tracing::debug;

pub type DbPool = Pool<Sqlite>;

/// Owns the SQLite connection pool. Opened once by the process entry point
/// and handed to repositories and the migrator by injection.
#[derive(Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> TaskGenieResult<Self> {
        debug!("Opening SQLite database at: {}", url);

        let connect_options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        // Every connection to an in-memory URL is its own database, so the
        // pool must collapse to a single connection there.
        let max_connections = if url.contains(":memory:") {
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(config.min_connections.min(max_connections))
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_with(connect_options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> TaskGenieResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
