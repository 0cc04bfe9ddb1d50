//! Pledge lifecycle.
//!
//! The backend is the source of truth; the local list is a cache that is
//! only touched after a confirmed 2xx. Nothing is retried.

use chrono::{DateTime, Utc};
use donor_api::{ApiClient, NewPledge, PledgeQuery, PledgeUpdate};
use donor_core::validation::validate_notes;
use donor_core::{CancellationReason, EvolutionStatus, Pledge, PledgeStatus, ValidationError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::DonorError;
use crate::session::SessionStore;

/// Filters for [`PledgeManager::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PledgeFilter {
    pub status: Option<PledgeStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PledgeFilter {
    pub fn status(status: PledgeStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    fn to_query(&self) -> PledgeQuery {
        // "cancelled" spans four backend codes, so it is filtered locally.
        let evolution_status = match self.status {
            Some(PledgeStatus::Active) => Some(EvolutionStatus::Initiated),
            Some(PledgeStatus::Completed) => Some(EvolutionStatus::Honored),
            Some(PledgeStatus::Cancelled) | None => None,
        };
        PledgeQuery {
            evolution_status,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Creates, lists and moves pledges through their lifecycle.
pub struct PledgeManager {
    api: ApiClient,
    session: SessionStore,
    cache: RwLock<Vec<Pledge>>,
}

impl PledgeManager {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self {
            api,
            session,
            cache: RwLock::new(Vec::new()),
        }
    }

    /// Pledge against a blood donation request.
    ///
    /// When the backend does not echo the created pledge, the list is
    /// reloaded and the newest pledge for the request is returned.
    pub async fn create(&self, request_id: &str, notes: Option<&str>) -> Result<Pledge, DonorError> {
        let request_id = request_id.trim();
        if request_id.is_empty() {
            return Err(DonorError::validation(ValidationError::Required(
                "requestId".to_string(),
            )));
        }
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        if let Some(notes) = notes {
            validate_notes(notes).map_err(DonorError::validation)?;
        }
        let token = self.session.token().ok_or(DonorError::NotAuthenticated)?;

        let body = NewPledge {
            request_id: request_id.to_string(),
            pledge_date: Utc::now(),
            notes: notes.map(str::to_string),
        };
        let echoed = self
            .api
            .authorized(&token)
            .create_pledge(&body)
            .await
            .map_err(|e| {
                warn!("Pledge creation for request {} failed: {}", request_id, e);
                DonorError::pledge_creation(&e)
            })?;

        let pledge = match echoed {
            Some(pledge) => {
                self.cache.write().await.push(pledge.clone());
                pledge
            }
            None => {
                debug!("Pledge not echoed back, reloading list");
                let pledges = self.list(&PledgeFilter::default()).await?;
                newest_for_request(&pledges, request_id).ok_or_else(|| DonorError::PledgeCreation {
                    status: None,
                    message: format!("created pledge for request {} not found", request_id),
                })?
            }
        };

        info!("Pledged {} against request {}", pledge.id, pledge.request_id);
        Ok(pledge)
    }

    /// Fetch pledges.
    ///
    /// An unfiltered, unpaged fetch replaces the cache. A filtered or paged
    /// one is merged into it by id so pledges outside the filter keep their
    /// known state.
    pub async fn list(&self, filter: &PledgeFilter) -> Result<Vec<Pledge>, DonorError> {
        let token = self.session.token().ok_or(DonorError::NotAuthenticated)?;

        let mut pledges = self
            .api
            .authorized(&token)
            .pledges(&filter.to_query())
            .await
            .map_err(|e| DonorError::pledge_operation(&e))?;

        if let Some(status) = filter.status {
            pledges.retain(|p| p.status() == status);
        }

        debug!("Fetched {} pledges", pledges.len());
        let mut cache = self.cache.write().await;
        if *filter == PledgeFilter::default() {
            *cache = pledges.clone();
        } else {
            merge_by_id(&mut cache, &pledges);
        }
        Ok(pledges)
    }

    /// Move the appointment of an active pledge.
    ///
    /// `appointment` must be strictly in the future.
    pub async fn reschedule(&self, pledge_id: &str, appointment: DateTime<Utc>) -> Result<(), DonorError> {
        if appointment <= Utc::now() {
            return Err(DonorError::validation(ValidationError::NotInFuture(
                "appointmentDate".to_string(),
            )));
        }

        self.transition(pledge_id, PledgeUpdate::reschedule(appointment))
            .await?;

        self.modify_cached(pledge_id, |p| p.appointment_date = Some(appointment))
            .await;
        info!("Rescheduled pledge {} to {}", pledge_id, appointment);
        Ok(())
    }

    /// Cancel a pledge. `reason` is required; see [`CancellationReason::parse`].
    pub async fn cancel(&self, pledge_id: &str, reason: &str) -> Result<(), DonorError> {
        let reason = CancellationReason::parse(reason).ok_or_else(|| {
            DonorError::validation(ValidationError::Required("cancellationReason".to_string()))
        })?;
        self.cancel_with(pledge_id, reason).await
    }

    /// Cancel a pledge with an already parsed reason.
    pub async fn cancel_with(&self, pledge_id: &str, reason: CancellationReason) -> Result<(), DonorError> {
        if let CancellationReason::Other(Some(detail)) = &reason {
            validate_notes(detail).map_err(DonorError::validation)?;
        }

        self.transition(pledge_id, PledgeUpdate::cancel(&reason))
            .await?;

        let recorded = reason.to_string();
        self.modify_cached(pledge_id, |p| {
            p.evolution_status = EvolutionStatus::CanceledByInitiator;
            p.cancellation_reason = Some(recorded);
        })
        .await;
        info!("Cancelled pledge {} ({})", pledge_id, reason.key());
        Ok(())
    }

    /// Mark a pledge as honored.
    pub async fn complete(&self, pledge_id: &str) -> Result<(), DonorError> {
        self.transition(pledge_id, PledgeUpdate::complete()).await?;

        self.modify_cached(pledge_id, |p| p.evolution_status = EvolutionStatus::Honored)
            .await;
        info!("Completed pledge {}", pledge_id);
        Ok(())
    }

    /// Snapshot of the cached pledges.
    pub async fn cached(&self) -> Vec<Pledge> {
        self.cache.read().await.clone()
    }

    pub async fn get(&self, pledge_id: &str) -> Option<Pledge> {
        self.cache
            .read()
            .await
            .iter()
            .find(|p| p.id == pledge_id)
            .cloned()
    }

    /// Check the cached state, then send the update.
    async fn transition(&self, pledge_id: &str, update: PledgeUpdate) -> Result<(), DonorError> {
        let pledge_id = pledge_id.trim();
        if pledge_id.is_empty() {
            return Err(DonorError::validation(ValidationError::Required(
                "pledgeId".to_string(),
            )));
        }
        let token = self.session.token().ok_or(DonorError::NotAuthenticated)?;

        if let Some(cached) = self.get(pledge_id).await {
            if !cached.evolution_status.can_transition_to(update.evolution_status) {
                return Err(DonorError::InvalidTransition {
                    pledge_id: pledge_id.to_string(),
                    status: cached.status(),
                });
            }
        }

        self.api
            .authorized(&token)
            .update_pledge(pledge_id, &update)
            .await
            .map_err(|e| {
                warn!("Pledge {} update failed: {}", pledge_id, e);
                DonorError::pledge_operation(&e)
            })
    }

    async fn modify_cached<F>(&self, pledge_id: &str, f: F)
    where
        F: FnOnce(&mut Pledge),
    {
        let pledge_id = pledge_id.trim();
        let mut cache = self.cache.write().await;
        match cache.iter_mut().find(|p| p.id == pledge_id) {
            Some(pledge) => f(pledge),
            None => debug!("Pledge {} not cached; local list left as is", pledge_id),
        }
    }
}

fn merge_by_id(cache: &mut Vec<Pledge>, fetched: &[Pledge]) {
    for pledge in fetched {
        match cache.iter_mut().find(|cached| cached.id == pledge.id) {
            Some(cached) => *cached = pledge.clone(),
            None => cache.push(pledge.clone()),
        }
    }
}

fn newest_for_request(pledges: &[Pledge], request_id: &str) -> Option<Pledge> {
    pledges
        .iter()
        .filter(|p| p.request_id == request_id && p.is_active())
        .max_by_key(|p| p.pledge_date)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use donor_api::ApiConfig;
    use donor_core::User;

    async fn manager() -> PledgeManager {
        // Nothing listens here; tests below must fail before any request.
        let api = ApiClient::new(ApiConfig::new("http://127.0.0.1:9")).unwrap();
        let session = SessionStore::new(None);
        session
            .set(User::minimal("1", "donor@example.com", None, "tok"))
            .await;
        PledgeManager::new(api, session)
    }

    fn pledge(id: &str, status: EvolutionStatus) -> Pledge {
        Pledge {
            id: id.to_string(),
            request_id: "r1".to_string(),
            hospital_name: None,
            blood_type: None,
            location: None,
            contact: None,
            pledge_date: None,
            appointment_date: None,
            evolution_status: status,
            cancellation_reason: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_reschedule_in_past_rejected() {
        let manager = manager().await;
        let err = manager
            .reschedule("p1", Utc::now() - Duration::minutes(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DonorError::Validation(ref errors) if errors == &[ValidationError::NotInFuture("appointmentDate".to_string())]
        ));
    }

    #[tokio::test]
    async fn test_cancel_without_reason_rejected() {
        let manager = manager().await;
        let err = manager.cancel("p1", "   ").await.unwrap_err();
        assert!(matches!(err, DonorError::Validation(_)));
    }

    #[tokio::test]
    async fn test_terminal_pledge_cannot_change() {
        let manager = manager().await;
        manager
            .cache
            .write()
            .await
            .push(pledge("p1", EvolutionStatus::Honored));

        let err = manager.cancel("p1", "illness").await.unwrap_err();
        assert!(matches!(
            err,
            DonorError::InvalidTransition { status: PledgeStatus::Completed, .. }
        ));
        assert_eq!(
            manager.get("p1").await.unwrap().evolution_status,
            EvolutionStatus::Honored
        );
    }

    #[tokio::test]
    async fn test_requires_session() {
        let api = ApiClient::new(ApiConfig::new("http://127.0.0.1:9")).unwrap();
        let manager = PledgeManager::new(api, SessionStore::new(None));
        assert!(matches!(
            manager.complete("p1").await,
            Err(DonorError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_cancelled_filter_is_local() {
        assert_eq!(PledgeFilter::status(PledgeStatus::Cancelled).to_query(), PledgeQuery::default());
        assert_eq!(
            PledgeFilter::status(PledgeStatus::Active).to_query().evolution_status,
            Some(EvolutionStatus::Initiated)
        );
    }

    #[test]
    fn test_newest_for_request() {
        let mut older = pledge("a", EvolutionStatus::Initiated);
        older.pledge_date = Some(Utc::now() - Duration::days(1));
        let mut newer = pledge("b", EvolutionStatus::Initiated);
        newer.pledge_date = Some(Utc::now());
        let closed = pledge("c", EvolutionStatus::CanceledTimeout);

        let found = newest_for_request(&[older, newer, closed], "r1").unwrap();
        assert_eq!(found.id, "b");
    }

    #[test]
    fn test_merge_keeps_pledges_outside_filter() {
        let mut cache = vec![
            pledge("done", EvolutionStatus::Honored),
            pledge("open", EvolutionStatus::Initiated),
        ];
        let mut moved = pledge("open", EvolutionStatus::Initiated);
        moved.notes = Some("bring id".to_string());

        merge_by_id(&mut cache, &[moved, pledge("new", EvolutionStatus::Initiated)]);

        let ids: Vec<&str> = cache.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["done", "open", "new"]);
        assert_eq!(cache[0].evolution_status, EvolutionStatus::Honored);
        assert_eq!(cache[1].notes.as_deref(), Some("bring id"));
    }
}
