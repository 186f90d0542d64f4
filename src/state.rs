use anyhow::Context;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::auth::sessions::Sessions;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: Sessions,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self {
            db,
            sessions: Sessions::default(),
        })
    }

    pub fn from_pool(db: SqlitePool) -> Self {
        Self {
            db,
            sessions: Sessions::default(),
        }
    }
}

// In-memory SQLite lives per connection, so test pools are pinned to one.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("migrations");
    db
}

#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    AppState::from_pool(test_pool().await)
}
