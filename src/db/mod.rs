pub mod customers;
pub mod memory;
pub mod refresh;
pub mod restaurants;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::DatabaseConfig;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no matching record")]
    NotFound,
    #[error("duplicate key")]
    Duplicate,
    #[error("stored row is malformed: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Maps unique-constraint violations to [`StoreError::Duplicate`].
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Database(err),
        }
    }
}

pub async fn create_pool(database: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let mut options = PgConnectOptions::from_str(&database.url)?;
    if let Some(user) = &database.user {
        options = options.username(user);
    }
    if let Some(password) = &database.password {
        options = options.password(password);
    }

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// 24 hex characters: 4 bytes of unix seconds at `now` followed by 8 random bytes.
pub fn new_object_id(now: DateTime<Utc>) -> String {
    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&(now.timestamp() as u32).to_be_bytes());
    rand::thread_rng().fill(&mut bytes[4..]);
    hex::encode(bytes)
}
