//! Cookie jar.
//!
//! Expired cookies are invisible to reads and are purged on the next write.

use sqlx::SqlitePool;

use crate::models::Cookie;
use crate::Result;

/// Set a cookie. `max_age_secs` of `None` stores a session cookie.
pub async fn set_cookie(
    pool: &SqlitePool,
    name: &str,
    value: &str,
    max_age_secs: Option<i64>,
) -> Result<()> {
    purge_expired(pool).await?;

    let modifier = max_age_secs.map(|secs| format!("{:+} seconds", secs));
    sqlx::query(
        r#"
        INSERT INTO cookies (name, value, expires_at)
        VALUES (?, ?, CASE WHEN ? IS NULL THEN NULL ELSE datetime('now', ?) END)
        ON CONFLICT(name) DO UPDATE SET
            value = excluded.value,
            expires_at = excluded.expires_at,
            updated_at = datetime('now')
        "#,
    )
    .bind(name)
    .bind(value)
    .bind(modifier.as_deref())
    .bind(modifier.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a live cookie.
pub async fn get_cookie(pool: &SqlitePool, name: &str) -> Result<Option<Cookie>> {
    let record = sqlx::query_as::<_, Cookie>(
        r#"
        SELECT name, value, expires_at, updated_at
        FROM cookies
        WHERE name = ?
          AND (expires_at IS NULL OR expires_at > datetime('now'))
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Get a live cookie's value.
pub async fn get_cookie_value(pool: &SqlitePool, name: &str) -> Result<Option<String>> {
    Ok(get_cookie(pool, name).await?.map(|cookie| cookie.value))
}

/// Remove a cookie. Removing a missing cookie is not an error.
pub async fn remove_cookie(pool: &SqlitePool, name: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM cookies
        WHERE name = ?
        "#,
    )
    .bind(name)
    .execute(pool)
    .await?;

    Ok(())
}

async fn purge_expired(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM cookies
        WHERE expires_at IS NOT NULL AND expires_at <= datetime('now')
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
