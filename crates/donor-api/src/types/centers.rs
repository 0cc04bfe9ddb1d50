//! Blood transfusion centers and subscriptions.

use donor_core::{BloodTransfusionCenter, Subscription};
use serde::{Deserialize, Serialize};

use super::common::{datetime, first_id, non_blank, IdValue, NamedRef};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CenterDto {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<IdValue>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub btc_name: Option<String>,
    #[serde(default)]
    pub wilaya_id: Option<IdValue>,
    #[serde(default)]
    pub wilaya: Option<NamedRef>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl CenterDto {
    pub fn into_center(self) -> Result<BloodTransfusionCenter, String> {
        let id = first_id([self.id, self.underscore_id])
            .ok_or_else(|| "center without an id".to_string())?;
        let name = non_blank(self.name)
            .or_else(|| non_blank(self.btc_name))
            .ok_or_else(|| format!("center {} has no name", id))?;
        Ok(BloodTransfusionCenter {
            id,
            name,
            wilaya_id: self
                .wilaya_id
                .as_ref()
                .and_then(IdValue::as_i64)
                .or_else(|| self.wilaya.as_ref().and_then(NamedRef::id)),
            wilaya: self.wilaya.as_ref().and_then(NamedRef::name),
            address: non_blank(self.address),
            phone: non_blank(self.phone).or_else(|| non_blank(self.contact)),
            email: non_blank(self.email),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionDto {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<IdValue>,
    #[serde(default)]
    pub btc_id: Option<IdValue>,
    #[serde(default)]
    pub btc: Option<NamedRef>,
    #[serde(default)]
    pub subscribed_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl SubscriptionDto {
    pub fn into_subscription(self) -> Result<Subscription, String> {
        let btc_id = first_id([
            self.btc_id,
            self.btc.as_ref().and_then(NamedRef::id).map(IdValue::Number),
        ])
        .ok_or_else(|| "subscription without a center".to_string())?;
        let id = first_id([self.id, self.underscore_id]).unwrap_or_else(|| btc_id.clone());
        Ok(Subscription {
            id,
            btc_id,
            center_name: self.btc.as_ref().and_then(NamedRef::name),
            subscribed_at: datetime(self.subscribed_at.as_deref())
                .or_else(|| datetime(self.created_at.as_deref())),
        })
    }
}

/// Body of `POST /subscriptions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscribeRequest<'a> {
    pub btc_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_center_with_wilaya_object() {
        let dto: CenterDto = serde_json::from_value(json!({
            "id": "btc-1",
            "name": "CTS Mustapha",
            "wilaya": {"id": 16, "name": "Alger"},
            "contact": "021000000"
        }))
        .unwrap();
        let center = dto.into_center().unwrap();
        assert_eq!(center.wilaya_id, Some(16));
        assert_eq!(center.wilaya.as_deref(), Some("Alger"));
        assert_eq!(center.phone.as_deref(), Some("021000000"));
    }

    #[test]
    fn test_subscription_from_embedded_center() {
        let dto: SubscriptionDto = serde_json::from_value(json!({
            "btc": {"id": 3, "name": "CTS Oran"},
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        let sub = dto.into_subscription().unwrap();
        assert_eq!(sub.btc_id, "3");
        assert_eq!(sub.id, "3");
        assert_eq!(sub.center_name.as_deref(), Some("CTS Oran"));
        assert!(sub.subscribed_at.is_some());
    }
}
