//! Administrative locations: wilayas (provinces) and communes.

use serde::{Deserialize, Serialize};

/// A wilaya (province).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wilaya {
    pub id: i64,
    pub name: String,
    /// Official two-digit code, when the backend provides it.
    #[serde(default)]
    pub code: Option<String>,
}

/// A commune (municipality) inside a wilaya.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commune {
    pub id: i64,
    pub name: String,
    pub wilaya_id: i64,
}

/// The commune descriptor stored on a donor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommuneRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub wilaya_id: Option<i64>,
}

/// A commune together with the wilaya it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommuneDetails {
    pub id: i64,
    pub name: String,
    pub wilaya_id: i64,
    /// Wilaya display name, when the details endpoint embeds it.
    #[serde(default)]
    pub wilaya_name: Option<String>,
}

impl From<&Commune> for CommuneRef {
    fn from(commune: &Commune) -> Self {
        Self {
            id: commune.id,
            name: Some(commune.name.clone()),
            wilaya_id: Some(commune.wilaya_id),
        }
    }
}

impl From<&CommuneDetails> for CommuneRef {
    fn from(details: &CommuneDetails) -> Self {
        Self {
            id: details.id,
            name: Some(details.name.clone()),
            wilaya_id: Some(details.wilaya_id),
        }
    }
}
