//! Pledge payloads.

use chrono::{DateTime, Utc};
use donor_core::{CancellationReason, EvolutionStatus, Pledge};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{blood_type, datetime, first_id, non_blank, IdValue};
use super::requests::RequestDto;

/// Filters for `GET /Pledges`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PledgeQuery {
    pub evolution_status: Option<EvolutionStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PledgeQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.evolution_status {
            pairs.push(("evolutionStatus", status.code().to_string()));
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

/// Body of `POST /Pledges`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPledge {
    pub request_id: String,
    pub pledge_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `PUT /Pledges/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PledgeUpdate {
    pub evolution_status: EvolutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl PledgeUpdate {
    /// Move the appointment; the pledge stays initiated.
    pub fn reschedule(appointment_date: DateTime<Utc>) -> Self {
        Self {
            evolution_status: EvolutionStatus::Initiated,
            appointment_date: Some(appointment_date),
            cancellation_reason: None,
        }
    }

    /// Cancel on the donor's initiative.
    pub fn cancel(reason: &CancellationReason) -> Self {
        Self {
            evolution_status: EvolutionStatus::CanceledByInitiator,
            appointment_date: None,
            cancellation_reason: Some(reason.to_string()),
        }
    }

    pub fn complete() -> Self {
        Self {
            evolution_status: EvolutionStatus::Honored,
            appointment_date: None,
            cancellation_reason: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PledgeDto {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<IdValue>,
    #[serde(default)]
    pub request_id: Option<IdValue>,
    #[serde(default)]
    pub blood_donation_request_id: Option<IdValue>,
    #[serde(default)]
    pub blood_donation_request: Option<RequestDto>,
    #[serde(default)]
    pub hospital_name: Option<String>,
    #[serde(default)]
    pub blood_type: Option<Value>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub pledge_date: Option<String>,
    #[serde(default)]
    pub appointment_date: Option<String>,
    #[serde(default)]
    pub evolution_status: Option<i64>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PledgeDto {
    /// Convert, taking the hospital/location/contact snapshot from the
    /// embedded request when the pledge itself lacks it.
    pub fn into_pledge(self) -> Result<Pledge, String> {
        let id = first_id([self.id, self.underscore_id])
            .ok_or_else(|| "pledge without an id".to_string())?;

        let request = self
            .blood_donation_request
            .map(RequestDto::into_request)
            .transpose()
            .map_err(|e| format!("pledge {}: {}", id, e))?;

        let request_id = first_id([self.request_id, self.blood_donation_request_id])
            .or_else(|| request.as_ref().map(|r| r.id.clone()))
            .ok_or_else(|| format!("pledge {} has no request", id))?;

        let evolution_status = EvolutionStatus::try_from(self.evolution_status.unwrap_or(0))
            .map_err(|e| format!("pledge {}: {}", id, e))?;

        let snapshot = request.as_ref();
        Ok(Pledge {
            hospital_name: non_blank(self.hospital_name)
                .or_else(|| snapshot.and_then(|r| r.hospital_name.clone())),
            blood_type: blood_type(self.blood_type.as_ref())
                .or_else(|| snapshot.and_then(|r| r.blood_type)),
            location: non_blank(self.location)
                .or_else(|| snapshot.and_then(|r| r.location_label())),
            contact: non_blank(self.contact).or_else(|| {
                snapshot.and_then(|r| r.contact_phone.clone().or_else(|| r.contact_email.clone()))
            }),
            pledge_date: datetime(self.pledge_date.as_deref()),
            appointment_date: datetime(self.appointment_date.as_deref()),
            evolution_status,
            cancellation_reason: non_blank(self.cancellation_reason),
            notes: non_blank(self.notes),
            id,
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use donor_core::{BloodType, PledgeStatus};
    use serde_json::json;

    #[test]
    fn test_pledge_snapshot_from_embedded_request() {
        let dto: PledgeDto = serde_json::from_value(json!({
            "id": 7,
            "pledgeDate": "2024-04-01T09:30:00Z",
            "appointmentDate": null,
            "evolutionStatus": 3,
            "cancellationReason": "other: flooded road",
            "bloodDonationRequest": {
                "id": 12,
                "bloodGroup": "B+",
                "address": "Rue Larbi Ben M'hidi",
                "wilaya": "Oran",
                "btc": {"name": "CHU Oran", "contact": "041000000"}
            }
        }))
        .unwrap();

        let pledge = dto.into_pledge().unwrap();
        assert_eq!(pledge.id, "7");
        assert_eq!(pledge.request_id, "12");
        assert_eq!(pledge.hospital_name.as_deref(), Some("CHU Oran"));
        assert_eq!(pledge.blood_type, Some(BloodType::BPositive));
        assert_eq!(pledge.location.as_deref(), Some("Rue Larbi Ben M'hidi, Oran"));
        assert_eq!(pledge.contact.as_deref(), Some("041000000"));
        assert_eq!(pledge.status(), PledgeStatus::Cancelled);
        assert_eq!(pledge.appointment_date, None);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let dto: PledgeDto =
            serde_json::from_value(json!({"id": 1, "requestId": 2, "evolutionStatus": 9})).unwrap();
        assert!(dto.into_pledge().is_err());
    }

    #[test]
    fn test_update_bodies() {
        let when = Utc.with_ymd_and_hms(2030, 1, 15, 9, 0, 0).unwrap();
        assert_eq!(
            serde_json::to_value(PledgeUpdate::reschedule(when)).unwrap(),
            json!({"evolutionStatus": 0, "appointmentDate": "2030-01-15T09:00:00Z"})
        );

        let reason = CancellationReason::parse("illness").unwrap();
        assert_eq!(
            serde_json::to_value(PledgeUpdate::cancel(&reason)).unwrap(),
            json!({"evolutionStatus": 2, "cancellationReason": "illness"})
        );

        assert_eq!(
            serde_json::to_value(PledgeUpdate::complete()).unwrap(),
            json!({"evolutionStatus": 1})
        );
    }
}
