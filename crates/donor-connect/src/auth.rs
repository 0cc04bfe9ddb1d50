//! Login, registration and logout.

use std::sync::Arc;

use donor_api::{ApiClient, ApiError, UserQuery};
use donor_core::{match_user_record, FallbackPolicy, MatchKind, RegistrationForm, User};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::error::DonorError;
use crate::location::{resolve_profile_location, LocationResolver};
use crate::session::SessionStore;

/// Signs donors in and out, and registers new ones.
pub struct Authenticator {
    api: ApiClient,
    session: SessionStore,
    locations: Arc<dyn LocationResolver>,
    fallback: FallbackPolicy,
}

impl Authenticator {
    pub fn new(
        api: ApiClient,
        session: SessionStore,
        locations: Arc<dyn LocationResolver>,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            api,
            session,
            locations,
            fallback,
        }
    }

    /// Sign in and assemble the full session user.
    ///
    /// The login response only carries a token and part of the user, so a
    /// minimal session is committed straight away and then completed from the
    /// user listing. If the listing fails or no record matches, the minimal
    /// session stays in place and [`DonorError::UserReconciliation`] is
    /// returned.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, DonorError> {
        let login = match self.api.login(email, password).await {
            Ok(login) => login,
            Err(ApiError::Status { status, message }) => {
                warn!("Login rejected for {} (HTTP {})", email.trim(), status);
                return Err(DonorError::InvalidCredentials(message));
            }
            Err(e) => return Err(e.into()),
        };

        let identity = login.identity(email);
        let minimal = User::minimal(
            login.user_id.clone().unwrap_or_default(),
            identity.email.clone().unwrap_or_else(|| email.trim().to_string()),
            login.name.as_deref(),
            login.token.clone(),
        );
        self.session.set(minimal.clone()).await;
        debug!("Minimal session committed for {}", minimal.email);

        let candidates = self
            .api
            .authorized(&login.token)
            .list_users(&UserQuery::default())
            .await
            .map_err(|e| {
                warn!("User listing failed, keeping minimal session: {}", e);
                DonorError::UserReconciliation(e.user_message())
            })?;

        let matched = match_user_record(&identity, &candidates, self.fallback).map_err(|e| {
            warn!("Could not reconcile {}: {}", minimal.email, e);
            DonorError::UserReconciliation(e.to_string())
        })?;
        if matched.kind == MatchKind::Fallback {
            warn!(
                "No listing record matches {}; adopting the first of {} candidates",
                minimal.email,
                candidates.len()
            );
        }

        let mut user = User::from_record(matched.record, &minimal);
        match resolve_profile_location(self.locations.as_ref(), &user.profile).await {
            Ok(Some(fix)) => {
                fix.apply_to(&mut user.profile);
            }
            Ok(None) => {}
            Err(e) => warn!("Location left unresolved for {}: {}", user.email, e),
        }

        self.session.set(user.clone()).await;
        info!("Signed in {} ({:?} match)", user.email, matched.kind);
        Ok(user)
    }

    /// Register a new donor. Does not sign in.
    ///
    /// Every failing field is reported in one [`DonorError::Validation`]
    /// before anything is sent.
    pub async fn register(&self, form: &RegistrationForm) -> Result<(), DonorError> {
        let request = form.validate().map_err(DonorError::Validation)?;

        match self.api.register(&request).await {
            Ok(()) => {
                info!("Registered {}", request.email);
                Ok(())
            }
            Err(ApiError::Status { status, message }) => {
                warn!("Registration rejected (HTTP {}): {}", status, message);
                Err(DonorError::RegistrationConflict(message))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sign out. Always succeeds.
    pub async fn logout(&self) {
        let who = self.session.current().map(|u| u.email);
        self.session.clear().await;
        match who {
            Some(email) => info!("Signed out {}", email),
            None => debug!("Logout with no active session"),
        }
    }
}
