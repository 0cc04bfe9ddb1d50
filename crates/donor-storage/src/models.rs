//! Storage records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One key/value record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StorageEntry {
    pub key: String,
    /// Serialized value, usually JSON.
    pub value: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// A stored cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Expiry timestamp (UTC, SQLite `datetime` format); `None` for a
    /// session cookie.
    pub expires_at: Option<String>,
    pub updated_at: String,
}
