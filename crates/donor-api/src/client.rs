//! DonorConnect REST client.

use donor_core::{
    BloodDonationRequest, BloodTransfusionCenter, Commune, CommuneDetails, Pledge, ProfilePatch,
    RegistrationRequest, Subscription, UserRecord, Wilaya,
};
use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{extract_server_message, fallback_message, ApiError};
use crate::types::common::decode_list;
use crate::types::{
    single_item, CenterDto, CommuneDto, LoginDto, LoginRequest, LoginResponse, NewPledge,
    PledgeDto, PledgeQuery, PledgeUpdate, RequestDto, RequestQuery, SubscribeRequest,
    SubscriptionDto, UserDto, UserQuery, WilayaDto,
};

/// Client for the unauthenticated endpoints, and the entry point to the
/// authenticated ones via [`ApiClient::authorized`].
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Build a client. No request is made.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self { http, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Scope calls to a bearer token.
    pub fn authorized<'a>(&'a self, token: &'a str) -> AuthorizedClient<'a> {
        AuthorizedClient { api: self, token }
    }

    /// Exchange credentials for a token and a partial user.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let url = self.config.login_url();
        debug!("POST {}", url);

        let body = LoginRequest {
            email: email.trim(),
            password,
        };
        let response = self.execute(self.http.post(&url).json(&body)).await?;
        let dto: LoginDto = serde_json::from_value(single_item(read_json(response).await?))?;

        dto.into_response()
            .ok_or_else(|| ApiError::InvalidResponse("login response carries no token".to_string()))
    }

    /// Create a donor account. The new account is not signed in.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<(), ApiError> {
        let url = self.config.register_url();
        debug!("POST {}", url);

        self.execute(self.http.post(&url).json(request)).await?;
        Ok(())
    }

    pub async fn wilayas(&self) -> Result<Vec<Wilaya>, ApiError> {
        let url = self.config.wilayas_url();
        debug!("GET {}", url);

        let response = self.execute(self.http.get(&url)).await?;
        decode_list(read_json(response).await?, "wilaya", WilayaDto::into_wilaya)
    }

    pub async fn communes(&self, wilaya_id: i64) -> Result<Vec<Commune>, ApiError> {
        let url = self.config.communes_url(wilaya_id);
        debug!("GET {}", url);

        let response = self.execute(self.http.get(&url)).await?;
        decode_list(read_json(response).await?, "commune", |dto: CommuneDto| {
            dto.into_commune(wilaya_id)
        })
    }

    /// A commune with the wilaya it belongs to.
    pub async fn commune_details(&self, commune_id: i64) -> Result<CommuneDetails, ApiError> {
        let url = self.config.commune_details_url(commune_id);
        debug!("GET {}", url);

        let response = self.execute(self.http.get(&url)).await?;
        let dto: CommuneDto = serde_json::from_value(single_item(read_json(response).await?))?;
        dto.into_details().map_err(ApiError::InvalidResponse)
    }

    /// Send a request and turn non-2xx answers into [`ApiError::Status`].
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(ApiError::Http)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_server_message(&body).unwrap_or_else(|| fallback_message(status.as_u16()));
        warn!("Request failed with HTTP {}: {}", status.as_u16(), message);

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Calls that need the donor's bearer token.
///
/// The token goes in the `Authorization` header and is mirrored in a
/// `token` cookie.
#[derive(Clone, Copy)]
pub struct AuthorizedClient<'a> {
    api: &'a ApiClient,
    token: &'a str,
}

impl<'a> AuthorizedClient<'a> {
    fn get(&self, url: &str) -> RequestBuilder {
        self.with_auth(self.api.http.get(url))
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(COOKIE, format!("token={}", self.token))
    }

    /// The bulk user listing.
    pub async fn list_users(&self, query: &UserQuery) -> Result<Vec<UserRecord>, ApiError> {
        let url = self.api.config.users_url();
        debug!("GET {}", url);

        let response = self.api.execute(self.get(&url).query(&query.to_pairs())).await?;
        decode_list(read_json(response).await?, "user", UserDto::into_record)
    }

    /// Apply a partial profile update.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<(), ApiError> {
        let url = self.api.config.profile_url();
        debug!("PATCH {}", url);

        let request = self.with_auth(self.api.http.patch(&url).json(patch));
        self.api.execute(request).await?;
        Ok(())
    }

    pub async fn pledges(&self, query: &PledgeQuery) -> Result<Vec<Pledge>, ApiError> {
        let url = self.api.config.pledges_url();
        debug!("GET {}", url);

        let response = self.api.execute(self.get(&url).query(&query.to_pairs())).await?;
        decode_list(read_json(response).await?, "pledge", PledgeDto::into_pledge)
    }

    /// Create a pledge.
    ///
    /// Returns the created pledge when the backend echoes it back, `None` when
    /// it answers with an empty or unrecognized body.
    pub async fn create_pledge(&self, pledge: &NewPledge) -> Result<Option<Pledge>, ApiError> {
        let url = self.api.config.pledges_url();
        debug!("POST {} (request {})", url, pledge.request_id);

        let request = self.with_auth(self.api.http.post(&url).json(pledge));
        let response = self.api.execute(request).await?;

        let text = response.text().await.map_err(ApiError::Http)?;
        let created = serde_json::from_str::<Value>(&text)
            .and_then(|body| serde_json::from_value::<PledgeDto>(single_item(body)))
            .map_err(|e| e.to_string())
            .and_then(PledgeDto::into_pledge);
        match created {
            Ok(pledge) => Ok(Some(pledge)),
            Err(e) => {
                debug!("Created pledge not echoed back: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn update_pledge(&self, pledge_id: &str, update: &PledgeUpdate) -> Result<(), ApiError> {
        let url = self.api.config.pledge_url(pledge_id);
        debug!("PUT {} (status {})", url, update.evolution_status.code());

        let request = self.with_auth(self.api.http.put(&url).json(update));
        self.api.execute(request).await?;
        Ok(())
    }

    pub async fn blood_donation_requests(
        &self,
        query: &RequestQuery,
    ) -> Result<Vec<BloodDonationRequest>, ApiError> {
        let url = self.api.config.requests_url();
        debug!("GET {}", url);

        let response = self.api.execute(self.get(&url).query(&query.to_pairs())).await?;
        decode_list(read_json(response).await?, "blood donation request", RequestDto::into_request)
    }

    /// Transfusion centers, optionally restricted to one wilaya.
    pub async fn centers(&self, wilaya_id: Option<i64>) -> Result<Vec<BloodTransfusionCenter>, ApiError> {
        let url = self.api.config.centers_url();
        debug!("GET {}", url);

        let mut request = self.get(&url);
        if let Some(wilaya_id) = wilaya_id {
            request = request.query(&[("wilayaId", wilaya_id)]);
        }
        let response = self.api.execute(request).await?;
        decode_list(read_json(response).await?, "center", CenterDto::into_center)
    }

    pub async fn subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        let url = self.api.config.subscriptions_url();
        debug!("GET {}", url);

        let response = self.api.execute(self.get(&url)).await?;
        decode_list(read_json(response).await?, "subscription", SubscriptionDto::into_subscription)
    }

    /// Subscribe to a center's donation requests.
    pub async fn subscribe(&self, btc_id: &str) -> Result<(), ApiError> {
        let url = self.api.config.subscriptions_url();
        debug!("POST {} (center {})", url, btc_id);

        let request = self.with_auth(self.api.http.post(&url).json(&SubscribeRequest { btc_id }));
        self.api.execute(request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for AuthorizedClient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("base_url", &self.api.config.base_url)
            .finish_non_exhaustive()
    }
}

/// Read a JSON body; an empty body reads as `null`.
async fn read_json(response: Response) -> Result<Value, ApiError> {
    let text = response.text().await.map_err(ApiError::Http)?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
