//! Partial profile edits.
//!
//! [`ProfileChanges`] is what a donor typed in; [`ProfilePatch`] is the
//! validated body sent to `PATCH /donor/profile`, carrying only the fields
//! that actually change.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::blood::BloodType;
use crate::dates;
use crate::error::ProfileInputError;
use crate::user::User;
use crate::validation::{validate_notes, validate_phone, validate_required, ValidationError};

/// Raw profile edits. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    /// Blood type label or code as entered.
    pub blood_type: Option<String>,
    pub commune_id: Option<i64>,
    pub donor_tel: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub last_donation_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        *self == ProfileChanges::default()
    }

    /// Validate every present field and convert enumerations.
    ///
    /// An unknown blood type fails with
    /// [`ProfileInputError::Enumeration`].
    pub fn validate(&self) -> Result<ProfilePatch, ProfileInputError> {
        let blood_type = self
            .blood_type
            .as_deref()
            .map(str::parse::<BloodType>)
            .transpose()?;

        if let Some(name) = &self.name {
            validate_required("name", name)?;
        }
        if let Some(tel) = &self.donor_tel {
            validate_phone(tel)?;
        }
        if let Some(notes) = &self.notes {
            validate_notes(notes)?;
        }

        let today = Utc::now().date_naive();
        if self.birth_date.is_some_and(|d| d > today) {
            return Err(ValidationError::InFuture("donorBirthDate".to_string()).into());
        }
        if self.last_donation_date.is_some_and(|d| d > today) {
            return Err(ValidationError::InFuture("donorLastDonationDate".to_string()).into());
        }

        Ok(ProfilePatch {
            name: self.name.as_ref().map(|n| n.trim().to_string()),
            blood_type,
            commune_id: self.commune_id,
            donor_tel: self.donor_tel.as_ref().map(|t| t.trim().to_string()),
            donor_birth_date: self.birth_date,
            donor_last_donation_date: self.last_donation_date,
            notes: self.notes.clone(),
        })
    }
}

/// Validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "BloodType::serialize_code"
    )]
    pub blood_type: Option<BloodType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commune_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_tel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", with = "dates::option_date")]
    pub donor_birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", with = "dates::option_date")]
    pub donor_last_donation_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }

    /// Drop fields that already hold the submitted value.
    pub fn changed_from(mut self, user: &User) -> Self {
        let profile = &user.profile;
        if self.name.as_deref() == Some(user.name.as_str()) {
            self.name = None;
        }
        if self.blood_type.is_some() && self.blood_type == profile.blood_type {
            self.blood_type = None;
        }
        if self.commune_id.is_some() && self.commune_id == profile.commune_id {
            self.commune_id = None;
        }
        if self.donor_tel.is_some() && self.donor_tel == profile.donor_tel {
            self.donor_tel = None;
        }
        if self.donor_birth_date.is_some() && self.donor_birth_date == profile.donor_birth_date {
            self.donor_birth_date = None;
        }
        if self.donor_last_donation_date.is_some()
            && self.donor_last_donation_date == profile.donor_last_donation_date
        {
            self.donor_last_donation_date = None;
        }
        if self.notes.is_some() && self.notes == profile.notes {
            self.notes = None;
        }
        self
    }

    /// Merge the present fields into `user`, leaving everything else alone.
    ///
    /// A commune change invalidates the stored commune descriptor and wilaya;
    /// those are re-resolved separately.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        let profile = &mut user.profile;
        if let Some(blood_type) = self.blood_type {
            profile.blood_type = Some(blood_type);
        }
        if let Some(commune_id) = self.commune_id {
            if profile.commune_id != Some(commune_id) {
                profile.commune_id = Some(commune_id);
                profile.commune = None;
                profile.wilaya_id = None;
                profile.wilaya = None;
            }
        }
        if let Some(tel) = &self.donor_tel {
            profile.donor_tel = Some(tel.clone());
        }
        if let Some(date) = self.donor_birth_date {
            profile.donor_birth_date = Some(date);
        }
        if let Some(date) = self.donor_last_donation_date {
            profile.donor_last_donation_date = Some(date);
        }
        if let Some(notes) = &self.notes {
            profile.notes = Some(notes.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnumerationError;

    fn user() -> User {
        let mut user = User::minimal("1", "donor@example.com", Some("Donor"), "tok");
        user.profile.blood_type = Some(BloodType::BPositive);
        user.profile.commune_id = Some(1601);
        user.profile.wilaya_id = Some(16);
        user.profile.wilaya = Some("Alger".to_string());
        user
    }

    #[test]
    fn test_unknown_blood_type_is_enumeration_error() {
        let changes = ProfileChanges {
            blood_type: Some("Z+".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            changes.validate(),
            Err(ProfileInputError::Enumeration(EnumerationError::Unrecognized { .. }))
        ));
    }

    #[test]
    fn test_blood_type_serialized_as_code() {
        let patch = ProfileChanges {
            blood_type: Some("O-".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({ "bloodType": 8 }));
    }

    #[test]
    fn test_invalid_phone_rejected() {
        let changes = ProfileChanges {
            donor_tel: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            changes.validate(),
            Err(ProfileInputError::Validation(ValidationError::InvalidPhone(_)))
        ));
    }

    #[test]
    fn test_changed_from_drops_unchanged_fields() {
        let patch = ProfilePatch {
            blood_type: Some(BloodType::BPositive),
            commune_id: Some(1601),
            notes: Some("Available weekends".to_string()),
            ..Default::default()
        }
        .changed_from(&user());

        assert_eq!(
            patch,
            ProfilePatch {
                notes: Some("Available weekends".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_apply_commune_change_clears_location_names() {
        let mut user = user();
        ProfilePatch {
            commune_id: Some(3101),
            ..Default::default()
        }
        .apply_to(&mut user);

        assert_eq!(user.profile.commune_id, Some(3101));
        assert_eq!(user.profile.wilaya_id, None);
        assert_eq!(user.profile.wilaya, None);
        assert_eq!(user.profile.blood_type, Some(BloodType::BPositive));
    }

    #[test]
    fn test_empty_changes() {
        assert!(ProfileChanges::default().is_empty());
        assert!(ProfileChanges::default().validate().unwrap().is_empty());
    }
}
