//! Storage layer
//!
//! All mutation paths go through this module. The versioned entity store
//! lives in [`store`], the append-only change ledger in [`ledger`], and the
//! transactional order write path in [`orders`].

pub mod ledger;
pub mod orders;
pub mod store;
pub mod tenants;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Embedded migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Open the database, enable foreign keys, and run migrations.
///
/// Foreign key enforcement is what makes order-line insertion fail (and the
/// whole order transaction roll back) when a referenced menu item is gone.
pub async fn connect(database_url: &str) -> Result<SqlitePool, BoxError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// In-memory database for tests and ephemeral development runs.
///
/// A single connection: every pooled connection to `:memory:` would
/// otherwise open its own database.
pub async fn connect_memory() -> Result<SqlitePool, BoxError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    Ok(pool)
}
