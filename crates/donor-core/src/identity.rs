//! Matching a login response to a record from the user listing.
//!
//! The login endpoint only returns a token and a partial user. The full donor
//! profile has to be picked out of the bulk listing, and the backend is not
//! consistent about which identity keys it fills in.

use std::str::FromStr;

use crate::error::ReconciliationError;
use crate::user::UserRecord;

/// The identity facts known after login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: Option<String>,
    pub email: Option<String>,
    /// National identity number, when the partial login payload carries it.
    pub national_id: Option<String>,
}

/// What to do when no candidate matches the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Fail reconciliation.
    #[default]
    Reject,
    /// Adopt the first record of the listing.
    FirstCandidate,
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackPolicy::Reject => "reject",
            FallbackPolicy::FirstCandidate => "first",
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" | "none" | "" => Ok(FallbackPolicy::Reject),
            "first" | "first_candidate" => Ok(FallbackPolicy::FirstCandidate),
            other => Err(format!("unknown fallback policy '{}'", other)),
        }
    }
}

/// Which rule selected the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    NationalId,
    UserId,
    Email,
    Fallback,
}

/// A selected candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserMatch<'a> {
    pub record: &'a UserRecord,
    pub kind: MatchKind,
}

/// Select the listing record that belongs to the logged-in user.
///
/// Priority:
/// 1. exact national identity number
/// 2. user id, then email (case-insensitive)
/// 3. the first candidate, only under [`FallbackPolicy::FirstCandidate`]
pub fn match_user_record<'a>(
    identity: &UserIdentity,
    candidates: &'a [UserRecord],
    policy: FallbackPolicy,
) -> Result<UserMatch<'a>, ReconciliationError> {
    if candidates.is_empty() {
        return Err(ReconciliationError::EmptyListing);
    }

    if let Some(nin) = non_blank(identity.national_id.as_deref()) {
        if let Some(record) = candidates
            .iter()
            .find(|r| non_blank(r.national_id.as_deref()) == Some(nin))
        {
            return Ok(UserMatch {
                record,
                kind: MatchKind::NationalId,
            });
        }
    }

    if let Some(user_id) = non_blank(identity.user_id.as_deref()) {
        if let Some(record) = candidates.iter().find(|r| r.id.trim() == user_id) {
            return Ok(UserMatch {
                record,
                kind: MatchKind::UserId,
            });
        }
    }

    if let Some(email) = non_blank(identity.email.as_deref()) {
        if let Some(record) = candidates.iter().find(|r| {
            non_blank(r.email.as_deref()).is_some_and(|e| e.eq_ignore_ascii_case(email))
        }) {
            return Ok(UserMatch {
                record,
                kind: MatchKind::Email,
            });
        }
    }

    match policy {
        FallbackPolicy::FirstCandidate => Ok(UserMatch {
            record: &candidates[0],
            kind: MatchKind::Fallback,
        }),
        FallbackPolicy::Reject => Err(ReconciliationError::NoMatch {
            candidates: candidates.len(),
        }),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, email: &str, nin: Option<&str>) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            email: Some(email.to_string()),
            national_id: nin.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_national_id_beats_other_candidates() {
        let candidates = vec![
            record("1", "amina@example.com", Some("999999999999999")),
            record("2", "other@example.com", Some("123456789012345")),
        ];
        let identity = UserIdentity {
            user_id: Some("1".to_string()),
            email: Some("amina@example.com".to_string()),
            national_id: Some("123456789012345".to_string()),
        };

        let found = match_user_record(&identity, &candidates, FallbackPolicy::Reject).unwrap();
        assert_eq!(found.record.id, "2");
        assert_eq!(found.kind, MatchKind::NationalId);
    }

    #[test]
    fn test_user_id_before_email() {
        let candidates = vec![
            record("1", "amina@example.com", None),
            record("2", "karim@example.com", None),
        ];
        let identity = UserIdentity {
            user_id: Some("2".to_string()),
            email: Some("amina@example.com".to_string()),
            national_id: None,
        };

        let found = match_user_record(&identity, &candidates, FallbackPolicy::Reject).unwrap();
        assert_eq!(found.record.id, "2");
        assert_eq!(found.kind, MatchKind::UserId);
    }

    #[test]
    fn test_email_is_case_insensitive() {
        let candidates = vec![
            record("1", "someone@example.com", None),
            record("2", "Amina@Example.com", None),
        ];
        let identity = UserIdentity {
            email: Some("amina@example.com".to_string()),
            ..Default::default()
        };

        let found = match_user_record(&identity, &candidates, FallbackPolicy::Reject).unwrap();
        assert_eq!(found.record.id, "2");
        assert_eq!(found.kind, MatchKind::Email);
    }

    #[test]
    fn test_unmatched_nin_falls_through_to_email() {
        let candidates = vec![record("5", "amina@example.com", None)];
        let identity = UserIdentity {
            email: Some("amina@example.com".to_string()),
            national_id: Some("123456789012345".to_string()),
            ..Default::default()
        };

        let found = match_user_record(&identity, &candidates, FallbackPolicy::Reject).unwrap();
        assert_eq!(found.kind, MatchKind::Email);
    }

    #[test]
    fn test_no_match_rejected_by_default() {
        let candidates = vec![record("1", "someone@example.com", None)];
        let identity = UserIdentity {
            email: Some("amina@example.com".to_string()),
            ..Default::default()
        };

        let err = match_user_record(&identity, &candidates, FallbackPolicy::default()).unwrap_err();
        assert_eq!(err, ReconciliationError::NoMatch { candidates: 1 });
    }

    #[test]
    fn test_fallback_when_enabled() {
        let candidates = vec![
            record("1", "someone@example.com", None),
            record("2", "else@example.com", None),
        ];
        let identity = UserIdentity::default();

        let found =
            match_user_record(&identity, &candidates, FallbackPolicy::FirstCandidate).unwrap();
        assert_eq!(found.record.id, "1");
        assert_eq!(found.kind, MatchKind::Fallback);
    }

    #[test]
    fn test_empty_listing_always_fails() {
        let identity = UserIdentity::default();
        let err = match_user_record(&identity, &[], FallbackPolicy::FirstCandidate).unwrap_err();
        assert_eq!(err, ReconciliationError::EmptyListing);
    }

    #[test]
    fn test_fallback_policy_from_str() {
        assert_eq!("first".parse::<FallbackPolicy>().unwrap(), FallbackPolicy::FirstCandidate);
        assert_eq!("Reject".parse::<FallbackPolicy>().unwrap(), FallbackPolicy::Reject);
        assert!("maybe".parse::<FallbackPolicy>().is_err());
    }
}
