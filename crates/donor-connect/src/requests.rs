//! Browsing blood donation requests.

use chrono::Utc;
use donor_api::{ApiClient, RequestQuery};
use donor_core::{filter_requests, BloodDonationRequest, RequestFilter};
use tracing::debug;

use crate::error::DonorError;
use crate::session::SessionStore;

/// Fetches requests and applies local filtering and sorting.
pub struct RequestBrowser {
    api: ApiClient,
    session: SessionStore,
}

impl RequestBrowser {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Fetch with server-side `query`, then filter and sort with `filter`.
    pub async fn list(
        &self,
        query: &RequestQuery,
        filter: &RequestFilter,
    ) -> Result<Vec<BloodDonationRequest>, DonorError> {
        let token = self.session.token().ok_or(DonorError::NotAuthenticated)?;

        let fetched = self
            .api
            .authorized(&token)
            .blood_donation_requests(query)
            .await?;

        let kept = filter_requests(&fetched, filter, Utc::now());
        debug!("Kept {}/{} blood donation requests", kept.len(), fetched.len());
        Ok(kept)
    }

    /// A filter matching the signed-in donor: open requests their blood type
    /// can serve. Without a known blood type only the open filter applies.
    pub fn filter_for_donor(&self) -> RequestFilter {
        RequestFilter {
            compatible_with: self
                .session
                .current()
                .and_then(|user| user.profile.blood_type),
            open_only: true,
            ..Default::default()
        }
    }
}
