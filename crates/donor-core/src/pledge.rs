//! Donation pledges and their lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::blood::BloodType;
use crate::dates;
use crate::error::EnumerationError;

/// The backend's numeric lifecycle state of a pledge.
///
/// `Initiated` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvolutionStatus {
    Initiated,
    Honored,
    CanceledByInitiator,
    CanceledByServiceNotNeeded,
    CanceledByServiceCantBeDone,
    CanceledTimeout,
}

impl EvolutionStatus {
    pub const ALL: [EvolutionStatus; 6] = [
        EvolutionStatus::Initiated,
        EvolutionStatus::Honored,
        EvolutionStatus::CanceledByInitiator,
        EvolutionStatus::CanceledByServiceNotNeeded,
        EvolutionStatus::CanceledByServiceCantBeDone,
        EvolutionStatus::CanceledTimeout,
    ];

    pub fn code(self) -> u8 {
        match self {
            EvolutionStatus::Initiated => 0,
            EvolutionStatus::Honored => 1,
            EvolutionStatus::CanceledByInitiator => 2,
            EvolutionStatus::CanceledByServiceNotNeeded => 3,
            EvolutionStatus::CanceledByServiceCantBeDone => 4,
            EvolutionStatus::CanceledTimeout => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != EvolutionStatus::Initiated
    }

    /// Collapse into the three-way display status.
    pub fn pledge_status(self) -> PledgeStatus {
        match self {
            EvolutionStatus::Initiated => PledgeStatus::Active,
            EvolutionStatus::Honored => PledgeStatus::Completed,
            EvolutionStatus::CanceledByInitiator
            | EvolutionStatus::CanceledByServiceNotNeeded
            | EvolutionStatus::CanceledByServiceCantBeDone
            | EvolutionStatus::CanceledTimeout => PledgeStatus::Cancelled,
        }
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Staying `Initiated` is allowed (rescheduling). Nothing leaves a
    /// terminal state.
    pub fn can_transition_to(self, _next: EvolutionStatus) -> bool {
        !self.is_terminal()
    }
}

impl TryFrom<i64> for EvolutionStatus {
    type Error = EnumerationError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| EnumerationError::unrecognized("evolution status", code.to_string()))
    }
}

impl Serialize for EvolutionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for EvolutionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        EvolutionStatus::try_from(code).map_err(serde::de::Error::custom)
    }
}

/// Display status of a pledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PledgeStatus {
    Active,
    Completed,
    Cancelled,
}

impl PledgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PledgeStatus::Active => "active",
            PledgeStatus::Completed => "completed",
            PledgeStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PledgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a donor cancels a pledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    Illness,
    ScheduleConflict,
    TransportIssue,
    /// Any other cause, with the donor's own words when given.
    Other(Option<String>),
}

impl CancellationReason {
    /// Parse a reason from user input.
    ///
    /// Returns `None` for blank input. Known causes are matched by key
    /// ("schedule_conflict") or by label ("Schedule conflict"); anything else
    /// becomes [`CancellationReason::Other`] carrying the text.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let key = trimmed.to_lowercase().replace([' ', '-'], "_");
        let reason = match key.as_str() {
            "illness" | "sick" | "sickness" => CancellationReason::Illness,
            "schedule_conflict" | "schedule" => CancellationReason::ScheduleConflict,
            "transport_issue" | "transport" => CancellationReason::TransportIssue,
            "other" => CancellationReason::Other(None),
            _ => {
                let detail = trimmed
                    .strip_prefix("other:")
                    .map(str::trim)
                    .unwrap_or(trimmed);
                CancellationReason::Other(Some(detail.to_string()))
            }
        };
        Some(reason)
    }

    pub fn key(&self) -> &'static str {
        match self {
            CancellationReason::Illness => "illness",
            CancellationReason::ScheduleConflict => "schedule_conflict",
            CancellationReason::TransportIssue => "transport_issue",
            CancellationReason::Other(_) => "other",
        }
    }
}

impl fmt::Display for CancellationReason {
    /// The text persisted as the cancellation reason.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancellationReason::Other(Some(detail)) if !detail.is_empty() => {
                write!(f, "other: {}", detail)
            }
            other => f.write_str(other.key()),
        }
    }
}

/// A donor's pledge against a blood donation request.
///
/// Hospital, blood type, location and contact are a snapshot taken when the
/// pledge list was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pledge {
    pub id: String,
    pub request_id: String,
    pub hospital_name: Option<String>,
    pub blood_type: Option<BloodType>,
    pub location: Option<String>,
    pub contact: Option<String>,
    #[serde(default, with = "dates::option_datetime")]
    pub pledge_date: Option<DateTime<Utc>>,
    #[serde(default, with = "dates::option_datetime")]
    pub appointment_date: Option<DateTime<Utc>>,
    pub evolution_status: EvolutionStatus,
    pub cancellation_reason: Option<String>,
    pub notes: Option<String>,
}

impl Pledge {
    pub fn status(&self) -> PledgeStatus {
        self.evolution_status.pledge_status()
    }

    pub fn is_active(&self) -> bool {
        self.status() == PledgeStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_is_total() {
        let expected = [
            (0, PledgeStatus::Active),
            (1, PledgeStatus::Completed),
            (2, PledgeStatus::Cancelled),
            (3, PledgeStatus::Cancelled),
            (4, PledgeStatus::Cancelled),
            (5, PledgeStatus::Cancelled),
        ];
        for (code, status) in expected {
            let evolution = EvolutionStatus::try_from(code).unwrap();
            assert_eq!(evolution.code() as i64, code);
            assert_eq!(evolution.pledge_status(), status, "code {}", code);
        }
        assert!(EvolutionStatus::try_from(6).is_err());
        assert!(EvolutionStatus::try_from(-1).is_err());
    }

    #[test]
    fn test_only_initiated_can_transition() {
        use EvolutionStatus::*;
        for next in EvolutionStatus::ALL {
            assert!(Initiated.can_transition_to(next));
        }
        for terminal in [Honored, CanceledByInitiator, CanceledTimeout] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(Initiated));
            assert!(!terminal.can_transition_to(Honored));
        }
    }

    #[test]
    fn test_evolution_status_serde() {
        assert_eq!(serde_json::to_string(&EvolutionStatus::Honored).unwrap(), "1");
        let parsed: EvolutionStatus = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, EvolutionStatus::CanceledByServiceCantBeDone);
        assert!(serde_json::from_str::<EvolutionStatus>("9").is_err());
    }

    #[test]
    fn test_cancellation_reason_parse() {
        assert_eq!(CancellationReason::parse("illness"), Some(CancellationReason::Illness));
        assert_eq!(
            CancellationReason::parse("Schedule conflict"),
            Some(CancellationReason::ScheduleConflict)
        );
        assert_eq!(
            CancellationReason::parse("transport-issue"),
            Some(CancellationReason::TransportIssue)
        );
        assert_eq!(
            CancellationReason::parse("other: moved abroad"),
            Some(CancellationReason::Other(Some("moved abroad".to_string())))
        );
        assert_eq!(CancellationReason::parse("   "), None);
    }

    #[test]
    fn test_cancellation_reason_display() {
        assert_eq!(CancellationReason::Illness.to_string(), "illness");
        assert_eq!(CancellationReason::Other(None).to_string(), "other");
        assert_eq!(
            CancellationReason::Other(Some("car broke down".to_string())).to_string(),
            "other: car broke down"
        );
    }
}
