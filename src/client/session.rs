//! Session state snapshots.
//!
//! A [`SessionState`] is never edited in place by the adapter: every
//! transition below builds the complete next snapshot, which then replaces
//! the previous one and is handed to the observer.

use crate::error::AuthError;
use crate::user::User;

/// Authentication state exposed to the rendering layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    /// Signed-in user, present only while signed in and unexpired
    pub user: Option<User>,
    /// Whether a valid user is present
    pub is_logged_in: bool,
    /// Error of the most recent failed operation
    pub error: Option<AuthError>,
    /// Whether `error` was set by the most recent operation
    pub is_error: bool,
    /// Whether an operation is in flight
    pub is_loading: bool,
    /// Whether the access token is about to expire
    pub is_token_expiring: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            is_logged_in: false,
            error: None,
            is_error: false,
            is_loading: true,
            is_token_expiring: false,
        }
    }
}

/// Effective phase the session flags collapse to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Loading,
    LoggedOut,
    LoggedIn,
    TokenExpiring,
    Error,
}

impl SessionState {
    /// Signed-in state for `user`.
    pub fn logged_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_logged_in: true,
            error: None,
            is_error: false,
            is_loading: false,
            is_token_expiring: false,
        }
    }

    /// Settled signed-out state.
    pub fn logged_out() -> Self {
        Self {
            user: None,
            is_logged_in: false,
            error: None,
            is_error: false,
            is_loading: false,
            is_token_expiring: false,
        }
    }

    /// Failed callback completion or user query: the session is cleared.
    pub fn failed(error: AuthError) -> Self {
        Self {
            error: Some(error),
            is_error: true,
            ..Self::logged_out()
        }
    }

    /// An operation started. Any previous error is cleared.
    pub fn loading(&self) -> Self {
        Self {
            error: None,
            is_error: false,
            is_loading: true,
            ..self.clone()
        }
    }

    /// A redirect could not be started: the session is kept as it was.
    pub fn with_error(&self, error: AuthError) -> Self {
        Self {
            error: Some(error),
            is_error: true,
            is_loading: false,
            ..self.clone()
        }
    }

    pub fn token_expiring(&self) -> Self {
        Self {
            is_token_expiring: true,
            ..self.clone()
        }
    }

    /// The access token expired: user and login state are always cleared.
    pub fn token_expired(&self) -> Self {
        Self {
            user: None,
            is_logged_in: false,
            is_token_expiring: false,
            ..self.clone()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_error {
            Phase::Error
        } else if self.is_loading {
            Phase::Loading
        } else if !self.is_logged_in {
            Phase::LoggedOut
        } else if self.is_token_expiring {
            Phase::TokenExpiring
        } else {
            Phase::LoggedIn
        }
    }
}
