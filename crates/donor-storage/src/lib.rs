//! SQLite-backed durable storage for the DonorConnect client.
//!
//! Two tables stand in for what a browser keeps between reloads: a
//! key/value `local_storage` table and a `cookies` jar.
//!
//! # Example
//!
//! ```no_run
//! use donor_storage::{cookies, local_storage, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:donorconnect.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     local_storage::set_item(db.pool(), "donorconnect.user", "{}").await?;
//!     cookies::set_cookie(db.pool(), "token", "abc", None).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cookies;
pub mod error;
pub mod local_storage;
pub mod models;

pub use error::{Result, StorageError};
pub use models::{Cookie, StorageEntry};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Storage connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// A single client process only ever has a handful of writers.
    const DEFAULT_POOL_SIZE: u32 = 4;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for a throwaway store.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to storage: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Open an in-memory store with migrations applied.
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect_with_pool_size("sqlite::memory:", 1).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Run storage migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::debug!("Running storage migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::debug!("Storage migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_crud() {
        let db = Database::in_memory().await.unwrap();

        assert_eq!(local_storage::get_item(db.pool(), "k").await.unwrap(), None);

        local_storage::set_item(db.pool(), "k", "v1").await.unwrap();
        local_storage::set_item(db.pool(), "k", "v2").await.unwrap();
        local_storage::set_item(db.pool(), "a", "x").await.unwrap();
        assert_eq!(
            local_storage::get_item(db.pool(), "k").await.unwrap().as_deref(),
            Some("v2")
        );
        assert_eq!(local_storage::keys(db.pool()).await.unwrap(), vec!["a", "k"]);

        local_storage::remove_item(db.pool(), "k").await.unwrap();
        local_storage::remove_item(db.pool(), "k").await.unwrap();
        assert_eq!(local_storage::get_item(db.pool(), "k").await.unwrap(), None);

        local_storage::clear(db.pool()).await.unwrap();
        assert!(local_storage::keys(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cookie_lifecycle() {
        let db = Database::in_memory().await.unwrap();

        cookies::set_cookie(db.pool(), "token", "abc", None).await.unwrap();
        let cookie = cookies::get_cookie(db.pool(), "token").await.unwrap().unwrap();
        assert_eq!(cookie.value, "abc");
        assert_eq!(cookie.expires_at, None);

        cookies::set_cookie(db.pool(), "token", "def", Some(3600)).await.unwrap();
        let cookie = cookies::get_cookie(db.pool(), "token").await.unwrap().unwrap();
        assert_eq!(cookie.value, "def");
        assert!(cookie.expires_at.is_some());

        cookies::remove_cookie(db.pool(), "token").await.unwrap();
        assert_eq!(cookies::get_cookie_value(db.pool(), "token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_cookie_is_invisible() {
        let db = Database::in_memory().await.unwrap();

        cookies::set_cookie(db.pool(), "old", "v", Some(-60)).await.unwrap();
        assert_eq!(cookies::get_cookie(db.pool(), "old").await.unwrap(), None);
    }
}
