//! Error types for DonorConnect client operations.

use std::time::Duration;

use donor_api::ApiError;
use donor_core::{EnumerationError, PledgeStatus, ProfileInputError, ValidationError};
use donor_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the client services.
///
/// Validation and enumeration errors are always raised before any network
/// call is made.
#[derive(Debug, Error)]
pub enum DonorError {
    /// The login endpoint rejected the credentials.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// One or more fields failed validation.
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// The backend refused the registration.
    #[error("registration rejected: {0}")]
    RegistrationConflict(String),

    /// The full user record could not be assembled after login.
    #[error("user reconciliation failed: {0}")]
    UserReconciliation(String),

    /// The stored session could not be parsed.
    #[error("corrupted session: {0}")]
    CorruptedSession(String),

    /// The profile update did not complete in time.
    #[error("profile update timed out after {}s", .0.as_secs())]
    ProfileUpdateTimeout(Duration),

    /// An enumerated value is not recognized.
    #[error("invalid value: {0}")]
    InvalidEnumeration(#[from] EnumerationError),

    /// Creating a pledge failed.
    #[error("pledge creation failed: {message}")]
    PledgeCreation { status: Option<u16>, message: String },

    /// Rescheduling, cancelling, completing or listing pledges failed.
    #[error("pledge operation failed: {message}")]
    PledgeOperation { status: Option<u16>, message: String },

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotAuthenticated,

    /// The pledge is in a terminal state.
    #[error("pledge {pledge_id} is {status} and can no longer change")]
    InvalidTransition {
        pledge_id: String,
        status: PledgeStatus,
    },

    /// Wilaya/commune lookup failed.
    #[error("location lookup failed: {0}")]
    Lookup(String),

    /// Any other backend failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Durable storage could not be opened.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DonorError {
    pub(crate) fn validation(error: ValidationError) -> Self {
        DonorError::Validation(vec![error])
    }

    pub(crate) fn pledge_creation(error: &ApiError) -> Self {
        DonorError::PledgeCreation {
            status: error.status(),
            message: error.user_message(),
        }
    }

    pub(crate) fn pledge_operation(error: &ApiError) -> Self {
        DonorError::PledgeOperation {
            status: error.status(),
            message: error.user_message(),
        }
    }

    /// HTTP status behind the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DonorError::PledgeCreation { status, .. } | DonorError::PledgeOperation { status, .. } => {
                *status
            }
            DonorError::Api(e) => e.status(),
            _ => None,
        }
    }
}

impl From<ProfileInputError> for DonorError {
    fn from(error: ProfileInputError) -> Self {
        match error {
            ProfileInputError::Enumeration(e) => DonorError::InvalidEnumeration(e),
            ProfileInputError::Validation(e) => DonorError::validation(e),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = DonorError::Validation(vec![
            ValidationError::Required("firstName".to_string()),
            ValidationError::PasswordMismatch,
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: firstName is required; Passwords do not match"
        );
    }

    #[test]
    fn test_pledge_operation_keeps_status() {
        let api = ApiError::Status {
            status: 409,
            message: "Pledge already closed".to_string(),
        };
        let err = DonorError::pledge_operation(&api);
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "pledge operation failed: Pledge already closed");
    }
}
