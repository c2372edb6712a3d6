use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::live::LiveHub;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub hub: LiveHub,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database_url)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(Self {
            pool,
            hub: LiveHub::new(),
        })
    }

    /// In-memory state for tests
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = db::connect_memory().await.map_err(|e| anyhow::anyhow!(e))?;
        Ok(Self {
            pool,
            hub: LiveHub::new(),
        })
    }
}
