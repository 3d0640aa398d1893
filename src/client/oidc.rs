//! Capability boundary to the wrapped OpenID Connect client.
//!
//! The adapter never performs protocol work itself. Redirects, callback
//! processing, token storage and renewal all belong to the implementation
//! behind [`OidcClient`]; the adapter only observes its results and events.

use crate::error::ClientError;
use crate::user::OidcUser;
use async_trait::async_trait;
use std::fmt;
use std::rc::Rc;

/// Lifecycle events emitted by the wrapped client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenEvent {
    /// The access token will expire within the configured warning lead time.
    AccessTokenExpiring,
    /// The access token has expired.
    AccessTokenExpired,
}

impl fmt::Display for TokenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessTokenExpiring => f.write_str("accessTokenExpiring"),
            Self::AccessTokenExpired => f.write_str("accessTokenExpired"),
        }
    }
}

/// Handle identifying a registered event listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Callback invoked when a [`TokenEvent`] fires.
pub type TokenEventListener = Rc<dyn Fn()>;

/// Operations the session adapter consumes from an OpenID Connect client.
///
/// All operations run on a single thread; returned futures need not be `Send`.
#[async_trait(?Send)]
pub trait OidcClient {
    /// Starts the sign-in redirect. On success the page navigates away.
    async fn signin_redirect(&self) -> Result<(), ClientError>;

    /// Starts the sign-out redirect. On success the page navigates away.
    async fn signout_redirect(&self) -> Result<(), ClientError>;

    /// Processes the provider's response on the login callback URL.
    async fn complete_signin_redirect(&self) -> Result<OidcUser, ClientError>;

    /// Processes the provider's response on the logout callback URL.
    async fn complete_signout_redirect(&self) -> Result<(), ClientError>;

    /// Returns the stored user, if any. The user may be expired.
    async fn get_user(&self) -> Result<Option<OidcUser>, ClientError>;

    /// Registers `listener` for `event`.
    fn add_listener(&self, event: TokenEvent, listener: TokenEventListener) -> ListenerId;

    /// Unregisters a listener. Returns false if `id` was not registered for `event`.
    fn remove_listener(&self, event: TokenEvent, id: ListenerId) -> bool;
}

/// Registration of one event listener, released when dropped.
pub struct EventSubscription<C: OidcClient> {
    client: Rc<C>,
    event: TokenEvent,
    id: ListenerId,
}

impl<C: OidcClient> EventSubscription<C> {
    pub fn register(client: &Rc<C>, event: TokenEvent, listener: TokenEventListener) -> Self {
        let id = client.add_listener(event, listener);
        tracing::trace!("Registered {} listener {:?}", event, id);
        Self {
            client: Rc::clone(client),
            event,
            id,
        }
    }

    pub fn event(&self) -> TokenEvent {
        self.event
    }
}

impl<C: OidcClient> Drop for EventSubscription<C> {
    fn drop(&mut self) {
        if self.client.remove_listener(self.event, self.id) {
            tracing::trace!("Removed {} listener {:?}", self.event, self.id);
        } else {
            tracing::warn!("{} listener {:?} was already removed", self.event, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::FakeClient;
    use std::cell::Cell;

    #[test]
    fn test_token_event_display() {
        assert_eq!(TokenEvent::AccessTokenExpiring.to_string(), "accessTokenExpiring");
        assert_eq!(TokenEvent::AccessTokenExpired.to_string(), "accessTokenExpired");
    }

    #[test]
    fn test_subscription_released_on_drop() {
        let client = Rc::new(FakeClient::default());
        let hits = Rc::new(Cell::new(0));

        let subscription = {
            let hits = Rc::clone(&hits);
            EventSubscription::register(
                &client,
                TokenEvent::AccessTokenExpired,
                Rc::new(move || hits.set(hits.get() + 1)),
            )
        };
        assert_eq!(subscription.event(), TokenEvent::AccessTokenExpired);
        assert_eq!(client.listener_count(TokenEvent::AccessTokenExpired), 1);

        client.fire(TokenEvent::AccessTokenExpired);
        assert_eq!(hits.get(), 1);

        drop(subscription);
        assert_eq!(client.listener_count(TokenEvent::AccessTokenExpired), 0);

        client.fire(TokenEvent::AccessTokenExpired);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listeners_are_per_event() {
        let client = Rc::new(FakeClient::default());
        let expiring = Rc::new(Cell::new(false));

        let _subscription = {
            let expiring = Rc::clone(&expiring);
            EventSubscription::register(
                &client,
                TokenEvent::AccessTokenExpiring,
                Rc::new(move || expiring.set(true)),
            )
        };

        client.fire(TokenEvent::AccessTokenExpired);
        assert!(!expiring.get());

        client.fire(TokenEvent::AccessTokenExpiring);
        assert!(expiring.get());
    }
}
