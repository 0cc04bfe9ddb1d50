//! Login and registration payloads.

use donor_core::UserIdentity;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use super::common::{first_id, non_blank, IdValue};

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    #[serde(serialize_with = "expose")]
    pub password: &'a SecretString,
}

fn expose<S: Serializer>(password: &&SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(password.expose_secret())
}

/// Raw login response.
///
/// Expected `{ token, userId, user }`, but the token and the user's identity
/// keys vary between backend versions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginDto {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<IdValue>,
    #[serde(default)]
    pub user: Option<LoginUserDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginUserDto {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<IdValue>,
    #[serde(default)]
    pub user_id: Option<IdValue>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, rename = "donorNIN")]
    pub donor_nin: Option<String>,
}

/// Normalized login result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    /// Bearer token for subsequent calls.
    pub token: String,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    /// National identity number from the partial user, if present.
    pub national_id: Option<String>,
}

impl LoginResponse {
    /// Identity facts for reconciling against the user listing.
    ///
    /// `login_email` is what the user typed and stands in when the response
    /// carries no email.
    pub fn identity(&self, login_email: &str) -> UserIdentity {
        UserIdentity {
            user_id: self.user_id.clone(),
            email: self
                .email
                .clone()
                .or_else(|| non_blank(Some(login_email.trim().to_string()))),
            national_id: self.national_id.clone(),
        }
    }
}

impl LoginDto {
    /// Normalize; `None` when the response has no usable token.
    pub fn into_response(self) -> Option<LoginResponse> {
        let token = non_blank(self.token).or_else(|| non_blank(self.access_token))?;
        let user = self.user.unwrap_or_default();

        let name = non_blank(user.name).or_else(|| {
            let full = [user.first_name, user.last_name]
                .into_iter()
                .flatten()
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            non_blank(Some(full))
        });

        Some(LoginResponse {
            token,
            user_id: first_id([self.user_id, user.user_id, user.id, user.underscore_id]),
            email: non_blank(user.email),
            name,
            national_id: non_blank(user.donor_nin.map(|nin| nin.trim().to_string())),
        })
    }
}
