//! Error types for domain conversions and matching.

use thiserror::Error;

use crate::validation::ValidationError;

/// A value that does not map onto one of the known enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnumerationError {
    /// The value is not a member of the enumeration.
    #[error("unrecognized {kind}: '{value}'")]
    Unrecognized { kind: &'static str, value: String },
}

impl EnumerationError {
    pub(crate) fn unrecognized(kind: &'static str, value: impl Into<String>) -> Self {
        EnumerationError::Unrecognized {
            kind,
            value: value.into(),
        }
    }
}

/// Why a login could not be matched to a full user record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    /// The user listing came back empty.
    #[error("user listing is empty")]
    EmptyListing,

    /// No candidate matched the login identity and the fallback is disabled.
    #[error("no user record matches the login identity ({candidates} candidates)")]
    NoMatch { candidates: usize },
}

/// Rejected profile input, detected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileInputError {
    /// An enumerated field holds an unknown value.
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    /// A field failed format validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
