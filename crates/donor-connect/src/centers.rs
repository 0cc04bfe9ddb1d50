//! Blood transfusion center directory and subscriptions.

use donor_api::ApiClient;
use donor_core::{BloodTransfusionCenter, Subscription, ValidationError};
use tracing::info;

use crate::error::DonorError;
use crate::session::SessionStore;

pub struct CenterDirectory {
    api: ApiClient,
    session: SessionStore,
}

impl CenterDirectory {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub async fn list_centers(&self, wilaya_id: Option<i64>) -> Result<Vec<BloodTransfusionCenter>, DonorError> {
        let token = self.session.token().ok_or(DonorError::NotAuthenticated)?;
        Ok(self.api.authorized(&token).centers(wilaya_id).await?)
    }

    pub async fn subscriptions(&self) -> Result<Vec<Subscription>, DonorError> {
        let token = self.session.token().ok_or(DonorError::NotAuthenticated)?;
        Ok(self.api.authorized(&token).subscriptions().await?)
    }

    /// Subscribe to a center's donation requests.
    pub async fn subscribe(&self, btc_id: &str) -> Result<(), DonorError> {
        let btc_id = btc_id.trim();
        if btc_id.is_empty() {
            return Err(DonorError::validation(ValidationError::Required("btcId".to_string())));
        }
        let token = self.session.token().ok_or(DonorError::NotAuthenticated)?;

        self.api.authorized(&token).subscribe(btc_id).await?;
        info!("Subscribed to center {}", btc_id);
        Ok(())
    }
}
