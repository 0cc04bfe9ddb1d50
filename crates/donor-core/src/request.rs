//! Blood donation requests issued by transfusion centers.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::blood::BloodType;
use crate::dates;

/// Hours before the due date at which a request becomes critical.
pub const CRITICAL_WINDOW_HOURS: i64 = 48;

/// Days before the due date at which a request becomes high priority.
pub const HIGH_WINDOW_DAYS: i64 = 7;

/// How pressing a request is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Normal,
    /// The request no longer accepts donors.
    Closed,
}

impl Urgency {
    /// Sort rank, most pressing first.
    pub fn rank(self) -> u8 {
        match self {
            Urgency::Critical => 0,
            Urgency::High => 1,
            Urgency::Normal => 2,
            Urgency::Closed => 3,
        }
    }
}

/// A center's call for donors of a given blood group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodDonationRequest {
    pub id: String,
    pub btc_id: Option<String>,
    pub hospital_name: Option<String>,
    pub blood_type: Option<BloodType>,
    pub wilaya_id: Option<i64>,
    pub wilaya: Option<String>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub quantity: Option<u32>,
    #[serde(default, with = "dates::option_datetime")]
    pub due_date: Option<DateTime<Utc>>,
    /// Backend lifecycle code; 0 means open.
    #[serde(default)]
    pub evolution_status: i64,
    pub description: Option<String>,
}

impl BloodDonationRequest {
    pub fn is_open(&self) -> bool {
        self.evolution_status == 0
    }

    /// Derive urgency from the status and how close the due date is.
    pub fn urgency(&self, now: DateTime<Utc>) -> Urgency {
        if !self.is_open() {
            return Urgency::Closed;
        }
        match self.due_date {
            Some(due) if due - now <= Duration::hours(CRITICAL_WINDOW_HOURS) => Urgency::Critical,
            Some(due) if due - now <= Duration::days(HIGH_WINDOW_DAYS) => Urgency::High,
            _ => Urgency::Normal,
        }
    }

    /// Short location line for display and pledge snapshots.
    pub fn location_label(&self) -> Option<String> {
        match (self.address.as_deref(), self.wilaya.as_deref()) {
            (Some(address), Some(wilaya)) => Some(format!("{}, {}", address, wilaya)),
            (Some(address), None) => Some(address.to_string()),
            (None, Some(wilaya)) => Some(wilaya.to_string()),
            (None, None) => None,
        }
    }
}

/// Sort order for request listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestSort {
    /// Most urgent first, then earliest due date.
    #[default]
    Urgency,
    /// Earliest due date first; undated requests last.
    DueDate,
    /// Largest quantity first.
    Quantity,
}

/// Local filters applied to a fetched request list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Keep only requests a donor of this group is matched against.
    pub compatible_with: Option<BloodType>,
    /// Keep only requests for exactly this group.
    pub blood_type: Option<BloodType>,
    pub wilaya_id: Option<i64>,
    pub open_only: bool,
    pub sort: RequestSort,
}

/// Filter and sort requests.
///
/// Requests without a blood type never pass a blood-type or compatibility
/// filter.
pub fn filter_requests(
    requests: &[BloodDonationRequest],
    filter: &RequestFilter,
    now: DateTime<Utc>,
) -> Vec<BloodDonationRequest> {
    let mut kept: Vec<BloodDonationRequest> = requests
        .iter()
        .filter(|r| !filter.open_only || r.is_open())
        .filter(|r| match filter.compatible_with {
            Some(donor) => r.blood_type.is_some_and(|bt| donor.can_serve(bt)),
            None => true,
        })
        .filter(|r| match filter.blood_type {
            Some(wanted) => r.blood_type == Some(wanted),
            None => true,
        })
        .filter(|r| match filter.wilaya_id {
            Some(wilaya_id) => r.wilaya_id == Some(wilaya_id),
            None => true,
        })
        .cloned()
        .collect();

    match filter.sort {
        RequestSort::Urgency => kept.sort_by(|a, b| {
            a.urgency(now)
                .rank()
                .cmp(&b.urgency(now).rank())
                .then_with(|| compare_due(a, b))
        }),
        RequestSort::DueDate => kept.sort_by(compare_due),
        RequestSort::Quantity => {
            kept.sort_by(|a, b| b.quantity.unwrap_or(0).cmp(&a.quantity.unwrap_or(0)))
        }
    }

    kept
}

fn compare_due(a: &BloodDonationRequest, b: &BloodDonationRequest) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, blood_type: BloodType) -> BloodDonationRequest {
        BloodDonationRequest {
            id: id.to_string(),
            btc_id: None,
            hospital_name: Some("CHU Mustapha".to_string()),
            blood_type: Some(blood_type),
            wilaya_id: Some(16),
            wilaya: Some("Alger".to_string()),
            address: None,
            contact_phone: None,
            contact_email: None,
            quantity: Some(2),
            due_date: None,
            evolution_status: 0,
            description: None,
        }
    }

    #[test]
    fn test_o_negative_donor_compatibility_filter() {
        let requests = vec![
            request("1", BloodType::ONegative),
            request("2", BloodType::APositive),
        ];
        let filter = RequestFilter {
            compatible_with: Some(BloodType::ONegative),
            ..Default::default()
        };

        let kept = filter_requests(&requests, &filter, Utc::now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "1");
    }

    #[test]
    fn test_filter_disabled_keeps_everything() {
        let requests = vec![
            request("1", BloodType::ONegative),
            request("2", BloodType::APositive),
        ];
        let kept = filter_requests(&requests, &RequestFilter::default(), Utc::now());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_urgency_derivation() {
        let now = Utc::now();
        let mut r = request("1", BloodType::APositive);

        r.due_date = Some(now + Duration::hours(12));
        assert_eq!(r.urgency(now), Urgency::Critical);

        r.due_date = Some(now - Duration::hours(1));
        assert_eq!(r.urgency(now), Urgency::Critical);

        r.due_date = Some(now + Duration::days(5));
        assert_eq!(r.urgency(now), Urgency::High);

        r.due_date = Some(now + Duration::days(30));
        assert_eq!(r.urgency(now), Urgency::Normal);

        r.due_date = None;
        assert_eq!(r.urgency(now), Urgency::Normal);

        r.evolution_status = 1;
        assert_eq!(r.urgency(now), Urgency::Closed);
    }

    #[test]
    fn test_sort_by_urgency_then_due_date() {
        let now = Utc::now();
        let mut normal = request("normal", BloodType::APositive);
        normal.due_date = Some(now + Duration::days(20));
        let mut high = request("high", BloodType::APositive);
        high.due_date = Some(now + Duration::days(3));
        let mut critical = request("critical", BloodType::APositive);
        critical.due_date = Some(now + Duration::hours(5));
        let mut closed = request("closed", BloodType::APositive);
        closed.evolution_status = 2;

        let kept = filter_requests(
            &[normal, closed, high, critical],
            &RequestFilter::default(),
            now,
        );
        let ids: Vec<&str> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["critical", "high", "normal", "closed"]);
    }

    #[test]
    fn test_open_only_and_wilaya_filters() {
        let mut closed = request("closed", BloodType::APositive);
        closed.evolution_status = 1;
        let mut oran = request("oran", BloodType::APositive);
        oran.wilaya_id = Some(31);
        let algiers = request("algiers", BloodType::APositive);

        let filter = RequestFilter {
            open_only: true,
            wilaya_id: Some(16),
            ..Default::default()
        };
        let kept = filter_requests(&[closed, oran, algiers], &filter, Utc::now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "algiers");
    }

    #[test]
    fn test_sort_by_quantity() {
        let mut small = request("small", BloodType::BPositive);
        small.quantity = Some(1);
        let mut large = request("large", BloodType::BPositive);
        large.quantity = Some(6);

        let filter = RequestFilter {
            sort: RequestSort::Quantity,
            ..Default::default()
        };
        let kept = filter_requests(&[small, large], &filter, Utc::now());
        assert_eq!(kept[0].id, "large");
    }
}
