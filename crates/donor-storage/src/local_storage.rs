//! Key/value storage, the durable counterpart of a browser's local storage.

use sqlx::SqlitePool;

use crate::models::StorageEntry;
use crate::Result;

/// Store a value under `key`, replacing any previous value.
pub async fn set_item(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO local_storage (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the value stored under `key`.
pub async fn get_item(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    Ok(get_entry(pool, key).await?.map(|entry| entry.value))
}

/// Get the full record stored under `key`.
pub async fn get_entry(pool: &SqlitePool, key: &str) -> Result<Option<StorageEntry>> {
    let record = sqlx::query_as::<_, StorageEntry>(
        r#"
        SELECT key, value, updated_at
        FROM local_storage
        WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Remove `key`. Removing a missing key is not an error.
pub async fn remove_item(pool: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM local_storage
        WHERE key = ?
        "#,
    )
    .bind(key)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove every key.
pub async fn clear(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM local_storage
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// List stored keys in alphabetical order.
pub async fn keys(pool: &SqlitePool) -> Result<Vec<String>> {
    let keys = sqlx::query_scalar::<_, String>(
        r#"
        SELECT key
        FROM local_storage
        ORDER BY key
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(keys)
}
