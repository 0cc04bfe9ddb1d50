//! The session user and full backend user records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::blood::BloodType;
use crate::dates;
use crate::location::CommuneRef;

/// Notification channels a donor has opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub email: bool,
    pub sms: bool,
    pub urgent_requests: bool,
    pub nearby_requests: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: true,
            urgent_requests: true,
            nearby_requests: true,
        }
    }
}

/// What other users and centers may see about a donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacySettings {
    pub show_profile: bool,
    pub show_blood_type: bool,
    pub show_contact: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_profile: true,
            show_blood_type: true,
            show_contact: true,
        }
    }
}

/// Donor-specific profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DonorProfile {
    pub blood_type: Option<BloodType>,
    pub wilaya_id: Option<i64>,
    /// Display name of `wilaya_id`; may lag behind it until resolved.
    pub wilaya: Option<String>,
    pub commune_id: Option<i64>,
    pub commune: Option<CommuneRef>,
    pub donor_tel: Option<String>,
    #[serde(rename = "donorNIN")]
    pub donor_nin: Option<String>,
    #[serde(with = "dates::option_date")]
    pub donor_birth_date: Option<NaiveDate>,
    #[serde(with = "dates::option_date")]
    pub donor_last_donation_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// The signed-in user, as held by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Opaque bearer token returned by the login endpoint.
    pub token: String,
    #[serde(default)]
    pub profile: DonorProfile,
    #[serde(default)]
    pub notification_preferences: NotificationPreferences,
    #[serde(default)]
    pub privacy_settings: PrivacySettings,
}

impl User {
    /// A session with identity and token only.
    ///
    /// Falls back to the local part of the email when no name is known.
    pub fn minimal(
        id: impl Into<String>,
        email: impl Into<String>,
        name: Option<&str>,
        token: impl Into<String>,
    ) -> Self {
        let email = email.into();
        let name = display_name(name, &email);
        Self {
            id: id.into(),
            email,
            name,
            token: token.into(),
            profile: DonorProfile::default(),
            notification_preferences: NotificationPreferences::default(),
            privacy_settings: PrivacySettings::default(),
        }
    }

    /// Build the full session user from a backend record.
    ///
    /// Identity fields missing from the record keep the values already known
    /// from the login response. Preferences start enabled/visible.
    pub fn from_record(record: &UserRecord, fallback: &User) -> Self {
        let email = record
            .email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| fallback.email.clone());
        let name = record
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback.name.clone());

        let commune_id = record
            .commune_id
            .or_else(|| record.commune.as_ref().map(|c| c.id));
        let wilaya_id = record
            .wilaya_id
            .or_else(|| record.commune.as_ref().and_then(|c| c.wilaya_id));

        Self {
            id: record.id.clone(),
            email,
            name,
            token: fallback.token.clone(),
            profile: DonorProfile {
                blood_type: record.blood_type,
                wilaya_id,
                wilaya: record.wilaya_name.clone(),
                commune_id,
                commune: record.commune.clone(),
                donor_tel: record.phone.clone(),
                donor_nin: record.national_id.clone(),
                donor_birth_date: record.birth_date,
                donor_last_donation_date: record.last_donation_date,
                notes: record.notes.clone(),
            },
            notification_preferences: NotificationPreferences::default(),
            privacy_settings: PrivacySettings::default(),
        }
    }

    /// Whether a location id is set without its display name.
    pub fn needs_location_resolution(&self) -> bool {
        let profile = &self.profile;
        (profile.wilaya_id.is_some() && profile.wilaya.is_none())
            || (profile.commune_id.is_some() && profile.wilaya_id.is_none())
    }
}

/// A full user record from the bulk listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// National identity number (NIN).
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub blood_type: Option<BloodType>,
    pub wilaya_id: Option<i64>,
    pub wilaya_name: Option<String>,
    pub commune_id: Option<i64>,
    pub commune: Option<CommuneRef>,
    pub birth_date: Option<NaiveDate>,
    pub last_donation_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn display_name(name: Option<&str>, email: &str) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => email.split('@').next().unwrap_or(email).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_uses_email_local_part() {
        let user = User::minimal("42", "amina@example.com", None, "tok");
        assert_eq!(user.name, "amina");
        assert_eq!(user.token, "tok");

        let named = User::minimal("42", "amina@example.com", Some("Amina B."), "tok");
        assert_eq!(named.name, "Amina B.");
    }

    #[test]
    fn test_from_record_keeps_token_and_defaults_preferences() {
        let minimal = User::minimal("42", "amina@example.com", None, "tok");
        let record = UserRecord {
            id: "42".to_string(),
            name: Some("Amina Benali".to_string()),
            blood_type: Some(BloodType::ONegative),
            commune: Some(CommuneRef {
                id: 1601,
                name: Some("Bab El Oued".to_string()),
                wilaya_id: Some(16),
            }),
            ..Default::default()
        };

        let user = User::from_record(&record, &minimal);
        assert_eq!(user.token, "tok");
        assert_eq!(user.email, "amina@example.com");
        assert_eq!(user.name, "Amina Benali");
        assert_eq!(user.profile.commune_id, Some(1601));
        assert_eq!(user.profile.wilaya_id, Some(16));
        assert!(user.notification_preferences.urgent_requests);
        assert!(user.privacy_settings.show_profile);
        assert!(user.needs_location_resolution());
    }

    #[test]
    fn test_user_serde_round_trip() {
        let mut user = User::minimal("7", "donor@example.com", Some("Donor"), "tok");
        user.profile.blood_type = Some(BloodType::APositive);
        user.profile.donor_birth_date = NaiveDate::from_ymd_opt(1990, 2, 14);

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"bloodType\":\"A+\""));
        assert!(json.contains("\"donorBirthDate\":\"1990-02-14\""));

        let parsed: User = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, user);
    }

    #[test]
    fn test_user_missing_preferences_default_on() {
        let json = r#"{"id":"1","email":"a@b.dz","name":"A","token":"t"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.notification_preferences, NotificationPreferences::default());
        assert_eq!(user.profile, DonorProfile::default());
    }
}
