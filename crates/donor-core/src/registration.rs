//! Donor registration form.

use chrono::{NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};

use crate::blood::BloodType;
use crate::dates;
use crate::validation::{
    validate_email, validate_national_id, validate_password, validate_phone, validate_required,
    ValidationError,
};

/// What a prospective donor submits to register.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    /// National identity number (NIN).
    pub national_id: String,
    pub phone: String,
    /// Blood type label or code as entered.
    pub blood_type: String,
    pub birth_date: Option<NaiveDate>,
    pub commune_id: Option<i64>,
}

impl RegistrationForm {
    /// Validate every field and build the request body.
    ///
    /// All failing fields are reported, not just the first.
    pub fn validate(&self) -> Result<RegistrationRequest, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut check = |result: Result<(), ValidationError>| {
            if let Err(e) = result {
                errors.push(e);
            }
        };

        check(validate_required("firstName", &self.first_name));
        check(validate_required("lastName", &self.last_name));
        check(validate_email(&self.email));
        check(validate_password(self.password.expose_secret()));
        check(validate_national_id(&self.national_id));
        check(validate_phone(&self.phone));

        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            errors.push(ValidationError::PasswordMismatch);
        }

        let blood_type = match self.blood_type.parse::<BloodType>() {
            Ok(bt) => Some(bt),
            Err(_) if self.blood_type.trim().is_empty() => {
                errors.push(ValidationError::Required("bloodType".to_string()));
                None
            }
            Err(_) => {
                errors.push(ValidationError::InvalidChoice {
                    field: "bloodType".to_string(),
                    value: self.blood_type.trim().to_string(),
                });
                None
            }
        };

        if self.birth_date.is_some_and(|d| d > Utc::now().date_naive()) {
            errors.push(ValidationError::InFuture("donorBirthDate".to_string()));
        }

        match blood_type {
            Some(blood_type) if errors.is_empty() => Ok(RegistrationRequest {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                email: self.email.trim().to_string(),
                password: self.password.clone(),
                donor_nin: self.national_id.trim().to_string(),
                donor_tel: self.phone.trim().to_string(),
                blood_type,
                donor_birth_date: self.birth_date,
                commune_id: self.commune_id,
            }),
            _ => Err(errors),
        }
    }
}

/// Validated body for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(serialize_with = "expose_password")]
    pub password: SecretString,
    #[serde(rename = "donorNIN")]
    pub donor_nin: String,
    pub donor_tel: String,
    #[serde(serialize_with = "blood_type_code")]
    pub blood_type: BloodType,
    #[serde(skip_serializing_if = "Option::is_none", with = "dates::option_date")]
    pub donor_birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commune_id: Option<i64>,
}

fn expose_password<S: Serializer>(password: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(password.expose_secret())
}

fn blood_type_code<S: Serializer>(blood_type: &BloodType, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(blood_type.code())
}
