//! Wilaya/commune lookup.
//!
//! A read-through cache over the unauthenticated location endpoints. Nothing
//! is cached when a call fails.

use std::collections::HashMap;

use async_trait::async_trait;
use donor_api::{ApiClient, ApiError};
use donor_core::{Commune, CommuneDetails, CommuneRef, DonorProfile, Wilaya};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::DonorError;

/// Resolves location ids to display data.
///
/// Abstracted so the session store and profile updater can be exercised
/// without a backend.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Display name of a wilaya, `None` when the id is unknown.
    async fn wilaya_name(&self, wilaya_id: i64) -> Result<Option<String>, DonorError>;

    /// A commune and the wilaya it belongs to.
    async fn commune_details(&self, commune_id: i64) -> Result<CommuneDetails, DonorError>;
}

/// Cached location lookup backed by the REST API.
pub struct LocationLookup {
    api: ApiClient,
    wilayas: RwLock<Option<Vec<Wilaya>>>,
    communes: RwLock<HashMap<i64, Vec<Commune>>>,
    details: RwLock<HashMap<i64, CommuneDetails>>,
}

impl LocationLookup {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            wilayas: RwLock::new(None),
            communes: RwLock::new(HashMap::new()),
            details: RwLock::new(HashMap::new()),
        }
    }

    /// All wilayas, fetched once.
    pub async fn wilayas(&self) -> Result<Vec<Wilaya>, DonorError> {
        if let Some(cached) = self.wilayas.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let fetched = self.api.wilayas().await.map_err(lookup_error)?;
        debug!("Cached {} wilayas", fetched.len());
        *self.wilayas.write().await = Some(fetched.clone());
        Ok(fetched)
    }

    /// Communes of one wilaya, cached per wilaya.
    pub async fn communes(&self, wilaya_id: i64) -> Result<Vec<Commune>, DonorError> {
        if let Some(cached) = self.communes.read().await.get(&wilaya_id) {
            return Ok(cached.clone());
        }

        let fetched = self.api.communes(wilaya_id).await.map_err(lookup_error)?;
        debug!("Cached {} communes for wilaya {}", fetched.len(), wilaya_id);
        self.communes
            .write()
            .await
            .insert(wilaya_id, fetched.clone());
        Ok(fetched)
    }
}

#[async_trait]
impl LocationResolver for LocationLookup {
    async fn wilaya_name(&self, wilaya_id: i64) -> Result<Option<String>, DonorError> {
        let wilayas = self.wilayas().await?;
        Ok(wilayas
            .into_iter()
            .find(|w| w.id == wilaya_id)
            .map(|w| w.name))
    }

    async fn commune_details(&self, commune_id: i64) -> Result<CommuneDetails, DonorError> {
        if let Some(cached) = self.details.read().await.get(&commune_id) {
            return Ok(cached.clone());
        }

        let fetched = self
            .api
            .commune_details(commune_id)
            .await
            .map_err(lookup_error)?;
        self.details
            .write()
            .await
            .insert(commune_id, fetched.clone());
        Ok(fetched)
    }
}

impl std::fmt::Debug for LocationLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationLookup")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

fn lookup_error(error: ApiError) -> DonorError {
    DonorError::Lookup(error.user_message())
}

/// Location data resolved for a profile.
///
/// Remembers which commune/wilaya ids it was resolved for so a result that
/// arrives after the profile moved on is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationFix {
    source_commune_id: Option<i64>,
    source_wilaya_id: Option<i64>,
    pub wilaya_id: Option<i64>,
    pub wilaya_name: Option<String>,
    pub commune: Option<CommuneRef>,
}

impl LocationFix {
    /// Write the resolved fields into `profile` if it still refers to the
    /// same location. Returns whether anything was applied.
    pub fn apply_to(&self, profile: &mut DonorProfile) -> bool {
        if profile.commune_id != self.source_commune_id || profile.wilaya_id != self.source_wilaya_id {
            return false;
        }
        if let Some(wilaya_id) = self.wilaya_id {
            profile.wilaya_id = Some(wilaya_id);
        }
        if self.wilaya_name.is_some() {
            profile.wilaya = self.wilaya_name.clone();
        }
        if self.commune.is_some() {
            profile.commune = self.commune.clone();
        }
        true
    }
}

/// Fill in what a profile's location ids leave unresolved.
///
/// A commune without a wilaya resolves through the commune details; a
/// wilaya id without a name resolves through the wilaya list. Returns
/// `Ok(None)` when nothing needs resolving.
pub async fn resolve_profile_location(
    resolver: &dyn LocationResolver,
    profile: &DonorProfile,
) -> Result<Option<LocationFix>, DonorError> {
    let needs_commune = profile.commune_id.is_some() && profile.wilaya_id.is_none();
    let needs_name = profile.wilaya_id.is_some() && profile.wilaya.is_none();
    if !needs_commune && !needs_name {
        return Ok(None);
    }

    let mut fix = LocationFix {
        source_commune_id: profile.commune_id,
        source_wilaya_id: profile.wilaya_id,
        wilaya_id: profile.wilaya_id,
        wilaya_name: None,
        commune: None,
    };

    if let (true, Some(commune_id)) = (needs_commune, profile.commune_id) {
        let details = resolver.commune_details(commune_id).await?;
        fix.wilaya_id = Some(details.wilaya_id);
        fix.wilaya_name = details.wilaya_name.clone();
        fix.commune = Some(CommuneRef::from(&details));
    }

    if fix.wilaya_name.is_none() && profile.wilaya.is_none() {
        if let Some(wilaya_id) = fix.wilaya_id {
            fix.wilaya_name = resolver.wilaya_name(wilaya_id).await?;
        }
    }

    Ok(Some(fix))
}
