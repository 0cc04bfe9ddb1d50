//! Configuration types for donor-api.

use std::env;
use std::time::Duration;

use crate::error::ApiError;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default timeout applied to every HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting to the DonorConnect backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API (e.g., "http://localhost:5000/api").
    pub base_url: String,
    /// Timeout for each HTTP request.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DONOR_API_URL` | Backend base URL | `http://localhost:5000/api` |
    /// | `DONOR_HTTP_TIMEOUT_SECS` | Request timeout | `30` |
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = env::var("DONOR_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout = match env::var("DONOR_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ApiError::Config(format!("Invalid DONOR_HTTP_TIMEOUT_SECS: {}", e)))?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self::new(base_url).with_timeout(timeout))
    }

    pub fn login_url(&self) -> String {
        format!("{}/auth/login", self.base_url)
    }

    pub fn register_url(&self) -> String {
        format!("{}/auth/register", self.base_url)
    }

    pub fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    pub fn profile_url(&self) -> String {
        format!("{}/donor/profile", self.base_url)
    }

    pub fn wilayas_url(&self) -> String {
        format!("{}/wilayas", self.base_url)
    }

    pub fn communes_url(&self, wilaya_id: i64) -> String {
        format!("{}/communes/{}", self.base_url, wilaya_id)
    }

    pub fn commune_details_url(&self, commune_id: i64) -> String {
        format!("{}/communes/details/{}", self.base_url, commune_id)
    }

    pub fn pledges_url(&self) -> String {
        format!("{}/Pledges", self.base_url)
    }

    /// URL of a single pledge; the id is percent-encoded.
    pub fn pledge_url(&self, pledge_id: &str) -> String {
        format!("{}/Pledges/{}", self.base_url, urlencoding::encode(pledge_id))
    }

    pub fn requests_url(&self) -> String {
        format!("{}/bloodDonationRequests", self.base_url)
    }

    pub fn centers_url(&self) -> String {
        format!("{}/BTC", self.base_url)
    }

    pub fn subscriptions_url(&self) -> String {
        format!("{}/subscriptions", self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
