//! Authentication data models

use serde::{Deserialize, Serialize};

/// Identity of the signed-in user as stored in the session cookie
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggedInUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub picture: String,
}

/// Profile returned by the identity provider's userinfo endpoint
///
/// Every field is optional on the wire; [`ProviderProfile::into_logged_in_user`]
/// enforces the minimum needed for a login.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProviderProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl ProviderProfile {
    /// Returns `None` unless both an id and an email are present
    pub fn into_logged_in_user(self) -> Option<LoggedInUser> {
        let id = self.id.filter(|s| !s.trim().is_empty())?;
        let email = self.email.filter(|s| !s.trim().is_empty())?;
        Some(LoggedInUser {
            id,
            name: self.name.unwrap_or_default(),
            email,
            phone: self.phone.unwrap_or_default(),
            picture: self.picture.unwrap_or_default(),
        })
    }
}

/// OAuth token endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

/// Query parameters delivered to the OAuth callback
#[derive(Deserialize, Debug, Default)]
pub struct CallbackQuery {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
