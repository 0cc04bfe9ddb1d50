//! DonorConnect backend client library.
//!
//! This crate provides a typed Rust client for the DonorConnect REST API.
//! It covers:
//!
//! - Login and registration
//! - The bulk user listing and donor profile updates
//! - Wilaya/commune lookups
//! - Pledges, blood donation requests, transfusion centers and subscriptions
//!
//! Payloads are decoded into `donor-core` types at the boundary; records the
//! backend returns in an unexpected shape are skipped with a warning instead
//! of failing a whole listing.
//!
//! # Example
//!
//! ```no_run
//! use donor_api::{ApiClient, ApiConfig, PledgeQuery};
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), donor_api::ApiError> {
//! let client = ApiClient::new(ApiConfig::default())?;
//!
//! let password = SecretString::from("Secret#123".to_string());
//! let login = client.login("amina@example.com", &password).await?;
//!
//! let pledges = client
//!     .authorized(&login.token)
//!     .pledges(&PledgeQuery::default())
//!     .await?;
//! println!("{} pledges", pledges.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{ApiClient, AuthorizedClient};
pub use config::ApiConfig;
pub use error::ApiError;
pub use types::*;
