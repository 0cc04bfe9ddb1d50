//! Blood donation request payloads.

use donor_core::{BloodDonationRequest, BloodType};
use serde::Deserialize;
use serde_json::Value;

use super::common::{blood_type, datetime, first_id, non_blank, IdValue, NamedRef};

/// Server-side filters for `GET /bloodDonationRequests`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestQuery {
    pub wilaya_id: Option<i64>,
    pub blood_type: Option<BloodType>,
    pub btc_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl RequestQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(wilaya_id) = self.wilaya_id {
            pairs.push(("wilayaId", wilaya_id.to_string()));
        }
        if let Some(bt) = self.blood_type {
            pairs.push(("bloodGroup", bt.code().to_string()));
        }
        if let Some(btc_id) = &self.btc_id {
            pairs.push(("btcId", btc_id.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        pairs
    }
}

/// The center block embedded in a request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmbeddedCenterDto {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub wilaya: Option<NamedRef>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestDto {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<IdValue>,
    #[serde(default)]
    pub btc_id: Option<IdValue>,
    #[serde(default)]
    pub btc: Option<EmbeddedCenterDto>,
    #[serde(default)]
    pub hospital_name: Option<String>,
    #[serde(default)]
    pub blood_group: Option<Value>,
    #[serde(default)]
    pub blood_type: Option<Value>,
    #[serde(default)]
    pub wilaya_id: Option<IdValue>,
    #[serde(default)]
    pub wilaya: Option<NamedRef>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub requested_quantity: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub request_due_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub evolution_status: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RequestDto {
    pub fn into_request(self) -> Result<BloodDonationRequest, String> {
        let id = first_id([self.id, self.underscore_id])
            .ok_or_else(|| "request without an id".to_string())?;
        let btc = self.btc.unwrap_or_default();

        let wilaya = self.wilaya.as_ref().or(btc.wilaya.as_ref());
        let quantity = self
            .requested_quantity
            .or(self.quantity)
            .and_then(|q| u32::try_from(q).ok());

        Ok(BloodDonationRequest {
            id,
            btc_id: first_id([self.btc_id, btc.id]),
            hospital_name: non_blank(self.hospital_name).or_else(|| non_blank(btc.name)),
            blood_type: blood_type(self.blood_group.as_ref())
                .or_else(|| blood_type(self.blood_type.as_ref())),
            wilaya_id: self
                .wilaya_id
                .as_ref()
                .and_then(IdValue::as_i64)
                .or_else(|| wilaya.and_then(NamedRef::id)),
            wilaya: wilaya.and_then(NamedRef::name),
            address: non_blank(self.address).or_else(|| non_blank(btc.address)),
            contact_phone: non_blank(self.contact_phone)
                .or_else(|| non_blank(btc.phone))
                .or_else(|| non_blank(btc.contact)),
            contact_email: non_blank(self.contact_email).or_else(|| non_blank(btc.email)),
            quantity,
            due_date: datetime(self.request_due_date.as_deref())
                .or_else(|| datetime(self.due_date.as_deref())),
            evolution_status: self.evolution_status.unwrap_or(0),
            description: non_blank(self.description).or_else(|| non_blank(self.notes)),
        })
    }
}
