//! User records on both sides of the adapter.
//!
//! [`OidcUser`] is the record owned by the wrapped client, in the shape the
//! `oidc-client` library serializes it. [`User`] is the read-only profile the
//! adapter hands to views.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standard OpenID Connect profile claims as held by the wrapped client.
///
/// Claims this crate does not name are kept in `additional_claims`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Subject - unique user identifier
    #[serde(default)]
    pub sub: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    /// Client IP address claim issued by Azure AD style providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipaddr: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    #[serde(flatten)]
    pub additional_claims: BTreeMap<String, serde_json::Value>,
}

/// Signed-in user as returned by the wrapped client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OidcUser {
    #[serde(default)]
    pub id_token: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub token_type: String,

    #[serde(default)]
    pub scope: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,

    /// Unix timestamp (seconds) at which the access token expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,

    #[serde(default)]
    pub profile: Profile,
}

impl OidcUser {
    /// Returns true if the access token had expired at `now` (Unix seconds).
    ///
    /// A user without an expiry never expires.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Returns true if the access token has expired.
    pub fn expired(&self) -> bool {
        self.is_expired_at(current_timestamp())
    }

    /// Seconds until the access token expires, zero once expired.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_sub(current_timestamp()))
    }
}

/// Profile of the signed-in user as seen by the rendering layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier (subject claim).
    pub id: String,

    pub email: Option<String>,

    /// User's display name.
    ///
    /// May be `None` if the provider did not release the `profile` scope.
    pub name: Option<String>,

    pub given_name: Option<String>,

    pub family_name: Option<String>,

    /// Client IP address recorded by the provider at sign-in, when released.
    pub ip_address: Option<String>,

    /// URL to the user's profile picture.
    pub picture: Option<String>,

    /// Raw identity token, for passing on to APIs that accept it.
    pub id_token: String,
}

impl From<&OidcUser> for User {
    fn from(user: &OidcUser) -> Self {
        tracing::trace!(
            "Adapting client user: sub={}, name={:?}, email={:?}",
            user.profile.sub,
            user.profile.name,
            user.profile.email
        );

        let profile = &user.profile;
        Self {
            id: profile.sub.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            given_name: profile.given_name.clone(),
            family_name: profile.family_name.clone(),
            ip_address: profile.ipaddr.clone(),
            picture: profile.picture.clone(),
            id_token: user.id_token.clone(),
        }
    }
}

impl User {
    /// Returns a display name for the user.
    ///
    /// Prefers the user's name, then given and family name, then email,
    /// and finally the user ID.
    ///
    /// # Example
    ///
    /// ```
    /// # use dxoidc::{OidcUser, User};
    /// let mut oidc_user = OidcUser::default();
    /// oidc_user.profile.sub = "248289761001".to_string();
    /// oidc_user.profile.email = Some("jane@example.com".to_string());
    /// let user = User::from(&oidc_user);
    /// assert_eq!(user.display_name(), "jane@example.com");
    /// ```
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match (&self.given_name, &self.family_name) {
            (Some(given), Some(family)) => return format!("{} {}", given, family),
            (Some(given), None) => return given.clone(),
            (None, Some(family)) => return family.clone(),
            (None, None) => {}
        }
        self.email.clone().unwrap_or_else(|| self.id.clone())
    }

    /// Returns the user's initials for avatar display.
    ///
    /// If the user has a name, returns the first letter of the first two words.
    /// Otherwise, returns the first two characters of the email or ID.
    pub fn initials(&self) -> String {
        if let Some(name) = &self.name {
            let parts: Vec<&str> = name.split_whitespace().collect();
            match parts.len() {
                0 => "??".to_string(),
                1 => parts[0].chars().take(2).collect::<String>().to_uppercase(),
                _ => {
                    let first = parts[0].chars().next().unwrap_or('?');
                    let second = parts[1].chars().next().unwrap_or('?');
                    format!("{}{}", first, second).to_uppercase()
                }
            }
        } else if let Some(email) = &self.email {
            email.chars().take(2).collect::<String>().to_uppercase()
        } else {
            self.id.chars().take(2).collect::<String>().to_uppercase()
        }
    }

    pub fn has_email(&self) -> bool {
        self.email.is_some()
    }

    pub fn has_picture(&self) -> bool {
        self.picture.is_some()
    }
}

/// Returns current Unix timestamp in seconds.
pub(crate) fn current_timestamp() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Date::now() / 1000.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
