//! Blood transfusion centers and donor subscriptions to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hospital-affiliated blood transfusion center (BTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodTransfusionCenter {
    pub id: String,
    pub name: String,
    pub wilaya_id: Option<i64>,
    pub wilaya: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A donor's subscription to a center's donation requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub btc_id: String,
    pub center_name: Option<String>,
    pub subscribed_at: Option<DateTime<Utc>>,
}
