//! Error types for the OIDC session adapter.
//!
//! Failures always come from the wrapped client's asynchronous operations.
//! They are reported to the adapter as [`ClientError`] and surfaced to views
//! as an [`AuthError`] naming the operation that failed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the wrapped OpenID Connect client.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ClientError {
    pub message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("malformed client payload: {}", err))
    }
}

/// Session error exposed to the rendering layer.
///
/// Each variant corresponds to one failure site of the adapter.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AuthError {
    /// Completing the sign-in redirect callback failed.
    #[error("sign-in callback failed: {0}")]
    SigninCallback(ClientError),

    /// Completing the sign-out redirect callback failed.
    #[error("sign-out callback failed: {0}")]
    SignoutCallback(ClientError),

    /// Loading the current user failed.
    #[error("failed to load current user: {0}")]
    UserQuery(ClientError),

    /// Starting the sign-in redirect failed before navigation happened.
    #[error("sign-in redirect failed: {0}")]
    SigninRedirect(ClientError),

    /// Starting the sign-out redirect failed before navigation happened.
    #[error("sign-out redirect failed: {0}")]
    SignoutRedirect(ClientError),
}

impl AuthError {
    /// The client failure underlying this session error.
    pub fn source_error(&self) -> &ClientError {
        match self {
            Self::SigninCallback(err)
            | Self::SignoutCallback(err)
            | Self::UserQuery(err)
            | Self::SigninRedirect(err)
            | Self::SignoutRedirect(err) => err,
        }
    }

    /// Returns true for failures that happened before a redirect left the page.
    ///
    /// These keep the session that was in place when the action was invoked.
    pub fn is_redirect_initiation(&self) -> bool {
        matches!(self, Self::SigninRedirect(_) | Self::SignoutRedirect(_))
    }
}

/// Invalid provider configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("client origin must be an http(s) URL, got {0:?}")]
    InvalidOrigin(String),

    #[error("redirect path must start with '/', got {0:?}")]
    InvalidRedirectPath(String),

    #[error("login and logout redirect paths must differ (both {0:?})")]
    DuplicateRedirectPath(String),

    #[error("redirect path {0:?} is the path a processed callback is replaced with")]
    RootRedirectPath(String),

    #[error("unknown client log level {0:?}, expected none, error, warn, info or debug")]
    InvalidLogLevel(String),
}
