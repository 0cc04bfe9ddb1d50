//! Client configuration.

use std::env;
use std::time::Duration;

use donor_api::ApiConfig;
use donor_core::FallbackPolicy;

use crate::error::DonorError;

/// Default bound on a profile update round trip.
pub const DEFAULT_PROFILE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`DonorConnect`](crate::DonorConnect).
#[derive(Debug, Clone)]
pub struct DonorConnectConfig {
    /// Backend connection settings.
    pub api: ApiConfig,
    /// Timeout applied to `PATCH /donor/profile`.
    pub profile_timeout: Duration,
    /// What login does when no listing record matches.
    pub fallback: FallbackPolicy,
    /// SQLite URL for durable session storage; `None` keeps the session in
    /// memory only.
    pub storage_url: Option<String>,
}

impl DonorConnectConfig {
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            profile_timeout: DEFAULT_PROFILE_TIMEOUT,
            fallback: FallbackPolicy::default(),
            storage_url: None,
        }
    }

    pub fn with_profile_timeout(mut self, timeout: Duration) -> Self {
        self.profile_timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = Some(url.into());
        self
    }

    /// Create configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DONOR_API_URL` | Backend base URL | `http://localhost:5000/api` |
    /// | `DONOR_HTTP_TIMEOUT_SECS` | Default request timeout | `30` |
    /// | `DONOR_PROFILE_TIMEOUT_SECS` | Profile update timeout | `10` |
    /// | `DONOR_RECONCILE_FALLBACK` | `first` adopts the first listed user when nothing matches | `reject` |
    /// | `DONOR_STORAGE_URL` | SQLite URL for the session | unset (memory only) |
    pub fn from_env() -> Result<Self, DonorError> {
        let api = ApiConfig::from_env().map_err(|e| DonorError::Config(e.to_string()))?;

        let profile_timeout = match env::var("DONOR_PROFILE_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                DonorError::Config(format!("Invalid DONOR_PROFILE_TIMEOUT_SECS: {}", e))
            })?,
            Err(_) => DEFAULT_PROFILE_TIMEOUT,
        };

        let fallback = match env::var("DONOR_RECONCILE_FALLBACK") {
            Ok(raw) => raw
                .parse::<FallbackPolicy>()
                .map_err(|e| DonorError::Config(format!("Invalid DONOR_RECONCILE_FALLBACK: {}", e)))?,
            Err(_) => FallbackPolicy::default(),
        };

        let storage_url = env::var("DONOR_STORAGE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            api,
            profile_timeout,
            fallback,
            storage_url,
        })
    }
}

impl Default for DonorConnectConfig {
    fn default() -> Self {
        Self::new(ApiConfig::default())
    }
}
