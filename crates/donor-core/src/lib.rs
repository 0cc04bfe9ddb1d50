//! Core domain types for the DonorConnect client.
//!
//! This crate holds everything that does not talk to the network or to disk:
//!
//! - [`BloodType`] and the donor/request compatibility table
//! - [`User`] (the session record) and [`UserRecord`] (a full backend record)
//! - [`match_user_record`] - the pure login reconciliation rule
//! - [`Pledge`] with its [`EvolutionStatus`] lifecycle
//! - [`BloodDonationRequest`] with urgency derivation and [`filter_requests`]
//! - Field validation for registration and profile edits
//!
//! # Example
//!
//! ```rust
//! use donor_core::{BloodType, EvolutionStatus, PledgeStatus};
//!
//! let donor: BloodType = "O-".parse().unwrap();
//! assert_eq!(donor.code(), 8);
//!
//! let status = EvolutionStatus::try_from(3).unwrap();
//! assert_eq!(status.pledge_status(), PledgeStatus::Cancelled);
//! ```

pub mod blood;
pub mod center;
pub mod dates;
pub mod error;
pub mod identity;
pub mod location;
pub mod pledge;
pub mod profile;
pub mod registration;
pub mod request;
pub mod user;
pub mod validation;

pub use blood::{BloodType, BLOOD_TYPE_COMPATIBILITY};
pub use center::{BloodTransfusionCenter, Subscription};
pub use error::{EnumerationError, ProfileInputError, ReconciliationError};
pub use identity::{match_user_record, FallbackPolicy, MatchKind, UserIdentity, UserMatch};
pub use location::{Commune, CommuneDetails, CommuneRef, Wilaya};
pub use pledge::{CancellationReason, EvolutionStatus, Pledge, PledgeStatus};
pub use profile::{ProfileChanges, ProfilePatch};
pub use registration::{RegistrationForm, RegistrationRequest};
pub use request::{filter_requests, BloodDonationRequest, RequestFilter, RequestSort, Urgency};
pub use user::{DonorProfile, NotificationPreferences, PrivacySettings, User, UserRecord};
pub use validation::ValidationError;
