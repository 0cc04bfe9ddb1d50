//! DonorConnect client services.
//!
//! This crate provides the [`DonorConnect`] context object, which owns the
//! session and hands it to the services that read and write it.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │       DonorConnect       │
//!                 └────────────┬─────────────┘
//!                              │ owns
//!       ┌──────────────┬───────┴──────┬──────────────┬──────────────┐
//!       ↓              ↓              ↓              ↓              ↓
//! Authenticator  ProfileUpdater  PledgeManager  RequestBrowser  CenterDirectory
//!       │              │              │              │              │
//!       └──────────────┴──────┬───────┴──────────────┴──────────────┘
//!                             ↓
//!                       SessionStore ──→ donor-storage (SQLite)
//!                             │
//!                             ↓
//!                      LocationLookup ──→ donor-api (REST)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use donor_connect::{DonorConnect, DonorConnectConfig};
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), donor_connect::DonorError> {
//! let app = DonorConnect::open(DonorConnectConfig::from_env()?).await?;
//!
//! let password = SecretString::from("Secret#123".to_string());
//! let user = app.auth().login("amina@example.com", &password).await?;
//! println!("Signed in as {}", user.name);
//!
//! app.pledges().cancel("17", "schedule_conflict").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod centers;
pub mod config;
pub mod error;
pub mod location;
pub mod pledges;
pub mod profile;
pub mod requests;
pub mod session;

pub use auth::Authenticator;
pub use centers::CenterDirectory;
pub use config::DonorConnectConfig;
pub use error::DonorError;
pub use location::{LocationLookup, LocationResolver};
pub use pledges::{PledgeFilter, PledgeManager};
pub use profile::{ProfileUpdateOutcome, ProfileUpdater};
pub use requests::RequestBrowser;
pub use session::SessionStore;

use std::sync::Arc;

use donor_api::ApiClient;
use donor_storage::Database;
use tracing::warn;

/// The client application context.
pub struct DonorConnect {
    config: DonorConnectConfig,
    api: ApiClient,
    session: SessionStore,
    locations: Arc<LocationLookup>,
    auth: Authenticator,
    profile: ProfileUpdater,
    pledges: PledgeManager,
    requests: RequestBrowser,
    centers: CenterDirectory,
}

impl DonorConnect {
    /// Connect storage (if configured), wire the services and restore the
    /// previous session.
    ///
    /// A corrupted stored session is logged and discarded; the client then
    /// starts signed out.
    pub async fn open(config: DonorConnectConfig) -> Result<Self, DonorError> {
        let api = ApiClient::new(config.api.clone())?;

        let database = match &config.storage_url {
            Some(url) => {
                let db = Database::connect(url).await?;
                db.migrate().await?;
                Some(db)
            }
            None => None,
        };

        let app = Self::new(config, api, database);
        match app.session.load().await {
            Ok(_) => {}
            Err(e @ DonorError::CorruptedSession(_)) => warn!("Starting signed out: {}", e),
            Err(e) => return Err(e),
        }
        Ok(app)
    }

    /// Wire the services around an existing client and optional storage.
    /// The stored session is not loaded.
    pub fn new(config: DonorConnectConfig, api: ApiClient, database: Option<Database>) -> Self {
        let locations = Arc::new(LocationLookup::new(api.clone()));
        let resolver: Arc<dyn LocationResolver> = locations.clone();
        let session = SessionStore::with_resolver(database, resolver.clone());

        Self {
            auth: Authenticator::new(api.clone(), session.clone(), resolver.clone(), config.fallback),
            profile: ProfileUpdater::new(api.clone(), session.clone(), resolver, config.profile_timeout),
            pledges: PledgeManager::new(api.clone(), session.clone()),
            requests: RequestBrowser::new(api.clone(), session.clone()),
            centers: CenterDirectory::new(api.clone(), session.clone()),
            config,
            api,
            session,
            locations,
        }
    }

    pub fn config(&self) -> &DonorConnectConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn locations(&self) -> &LocationLookup {
        &self.locations
    }

    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    pub fn profile(&self) -> &ProfileUpdater {
        &self.profile
    }

    pub fn pledges(&self) -> &PledgeManager {
        &self.pledges
    }

    pub fn requests(&self) -> &RequestBrowser {
        &self.requests
    }

    pub fn centers(&self) -> &CenterDirectory {
        &self.centers
    }
}

impl std::fmt::Debug for DonorConnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DonorConnect")
            .field("api", &self.api)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
