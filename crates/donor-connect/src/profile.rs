//! Donor profile edits and local preference toggles.

use std::sync::Arc;
use std::time::Duration;

use donor_api::{ApiClient, ApiError};
use donor_core::{NotificationPreferences, PrivacySettings, ProfileChanges, User};
use tracing::{debug, info, warn};

use crate::error::DonorError;
use crate::location::LocationResolver;
use crate::session::SessionStore;

/// Result of a profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdateOutcome {
    /// Every submitted field already held that value; nothing was sent.
    Unchanged,
    /// The backend accepted the change and the session was updated.
    Updated(User),
}

/// Applies partial profile edits to the backend and the session.
pub struct ProfileUpdater {
    api: ApiClient,
    session: SessionStore,
    locations: Arc<dyn LocationResolver>,
    timeout: Duration,
}

impl ProfileUpdater {
    pub fn new(
        api: ApiClient,
        session: SessionStore,
        locations: Arc<dyn LocationResolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            api,
            session,
            locations,
            timeout,
        }
    }

    /// Validate, send and merge a partial profile update.
    ///
    /// The request is bounded by the configured timeout and never retried.
    /// An HTTP client timeout that fires first is reported the same way.
    /// A commune change also re-resolves the wilaya; if that lookup fails
    /// the update still succeeds with a stale location display.
    pub async fn update(&self, changes: &ProfileChanges) -> Result<ProfileUpdateOutcome, DonorError> {
        let patch = changes.validate()?;
        let user = self.session.current().ok_or(DonorError::NotAuthenticated)?;

        let patch = patch.changed_from(&user);
        if patch.is_empty() {
            debug!("Profile update for {} has no changes", user.id);
            return Ok(ProfileUpdateOutcome::Unchanged);
        }

        let client = self.api.authorized(&user.token);
        match tokio::time::timeout(self.timeout, client.update_profile(&patch)).await {
            Err(_) => {
                warn!("Profile update for {} timed out after {:?}", user.id, self.timeout);
                return Err(DonorError::ProfileUpdateTimeout(self.timeout));
            }
            Ok(Err(ApiError::Http(e))) if e.is_timeout() => {
                warn!("Profile update for {} timed out in transport: {}", user.id, e);
                return Err(DonorError::ProfileUpdateTimeout(self.timeout));
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(())) => {}
        }

        let Some(mut updated) = self.session.update(|u| patch.apply_to(u)).await else {
            warn!("Session ended while updating profile for {}", user.id);
            return Err(DonorError::NotAuthenticated);
        };

        if patch.commune_id.is_some() && self.session.refresh_location(self.locations.as_ref()).await {
            if let Some(resolved) = self.session.current() {
                updated = resolved;
            }
        }

        info!("Profile updated for {}", updated.id);
        Ok(ProfileUpdateOutcome::Updated(updated))
    }

    /// Replace the notification preferences. Local only.
    pub async fn set_notification_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<User, DonorError> {
        self.session
            .update(|u| u.notification_preferences = preferences)
            .await
            .ok_or(DonorError::NotAuthenticated)
    }

    /// Replace the privacy settings. Local only.
    pub async fn set_privacy_settings(&self, settings: PrivacySettings) -> Result<User, DonorError> {
        self.session
            .update(|u| u.privacy_settings = settings)
            .await
            .ok_or(DonorError::NotAuthenticated)
    }
}
