//! Input validation for registration and profile fields.

use std::fmt;

/// Validation error types.
///
/// Every variant names the field it applies to so a front end can render it
/// next to the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Required(String),
    /// Invalid email format.
    InvalidEmail(String),
    /// Password does not meet the complexity rules.
    WeakPassword(String),
    /// Password confirmation differs from the password.
    PasswordMismatch,
    /// National identity number is not 15-18 digits.
    InvalidNationalId(String),
    /// Phone number is not a local mobile number.
    InvalidPhone(String),
    /// Value is not one of the accepted choices.
    InvalidChoice { field: String, value: String },
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Date must lie strictly in the future.
    NotInFuture(String),
    /// Date must not lie in the future.
    InFuture(String),
}

impl ValidationError {
    /// Name of the field this error applies to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required(field)
            | ValidationError::NotInFuture(field)
            | ValidationError::InFuture(field) => field,
            ValidationError::InvalidEmail(_) => "email",
            ValidationError::WeakPassword(_) => "password",
            ValidationError::PasswordMismatch => "confirmPassword",
            ValidationError::InvalidNationalId(_) => "donorNIN",
            ValidationError::InvalidPhone(_) => "donorTel",
            ValidationError::InvalidChoice { field, .. } | ValidationError::TooLong { field, .. } => {
                field
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required(field) => write!(f, "{} is required", field),
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::WeakPassword(msg) => write!(f, "Weak password: {}", msg),
            ValidationError::PasswordMismatch => write!(f, "Passwords do not match"),
            ValidationError::InvalidNationalId(msg) => {
                write!(f, "Invalid national identity number: {}", msg)
            }
            ValidationError::InvalidPhone(msg) => write!(f, "Invalid phone number: {}", msg),
            ValidationError::InvalidChoice { field, value } => {
                write!(f, "'{}' is not a valid {}", value, field)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::NotInFuture(field) => write!(f, "{} must be in the future", field),
            ValidationError::InFuture(field) => write!(f, "{} cannot be in the future", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Allowed national identity number lengths (digits).
pub const NATIONAL_ID_DIGITS: std::ops::RangeInclusive<usize> = 15..=18;

/// Maximum allowed length for free-text notes.
pub const MAX_NOTES_LENGTH: usize = 1000;

/// Require a non-blank value.
pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field.to_string()));
    }
    Ok(())
}

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(
            "must contain an @ symbol".to_string(),
        ));
    };

    if domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must look like example.com".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate password complexity.
///
/// At least [`MIN_PASSWORD_LENGTH`] characters, one uppercase letter and
/// one character that is neither a letter nor a digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Required("password".to_string()));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::WeakPassword(format!(
            "must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::WeakPassword(
            "must contain an uppercase letter".to_string(),
        ));
    }

    if password.chars().all(char::is_alphanumeric) {
        return Err(ValidationError::WeakPassword(
            "must contain a special character".to_string(),
        ));
    }

    Ok(())
}

/// Validate a national identity number (NIN): 15 to 18 digits.
pub fn validate_national_id(nin: &str) -> Result<(), ValidationError> {
    let nin = nin.trim();

    if nin.is_empty() {
        return Err(ValidationError::Required("donorNIN".to_string()));
    }

    if !nin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidNationalId(
            "must contain digits only".to_string(),
        ));
    }

    if !NATIONAL_ID_DIGITS.contains(&nin.len()) {
        return Err(ValidationError::InvalidNationalId(format!(
            "must be {} to {} digits, got {}",
            NATIONAL_ID_DIGITS.start(),
            NATIONAL_ID_DIGITS.end(),
            nin.len()
        )));
    }

    Ok(())
}

/// Validate a local mobile number.
///
/// Accepts `05XXXXXXXX`, `06XXXXXXXX`, `07XXXXXXXX` and the international
/// form `+2135XXXXXXXX` (spaces and dashes are ignored).
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let compact: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if compact.is_empty() {
        return Err(ValidationError::Required("donorTel".to_string()));
    }

    let subscriber = if let Some(rest) = compact.strip_prefix("+213") {
        rest
    } else if let Some(rest) = compact.strip_prefix('0') {
        rest
    } else {
        return Err(ValidationError::InvalidPhone(
            "must start with 0 or +213".to_string(),
        ));
    };

    if subscriber.len() != 9 || !subscriber.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone(
            "must have 9 digits after the prefix".to_string(),
        ));
    }

    if !matches!(subscriber.as_bytes()[0], b'5' | b'6' | b'7') {
        return Err(ValidationError::InvalidPhone(
            "must be a mobile number (5, 6 or 7)".to_string(),
        ));
    }

    Ok(())
}

/// Validate free-text notes length.
pub fn validate_notes(notes: &str) -> Result<(), ValidationError> {
    let len = notes.chars().count();
    if len > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
            actual: len,
        });
    }
    Ok(())
}
