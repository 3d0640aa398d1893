//! Session adapter over a wrapped OpenID Connect client.
//!
//! [`AuthSessionAdapter`] owns the client, listens to its token events, runs
//! the mount-time initialization branch and exposes sign-in / sign-out. Every
//! change produces a complete [`SessionState`] snapshot that is handed to the
//! registered observer.
//!
//! Overlapping operations are resolved with generation tickets: an operation
//! settling after a newer one has started is dropped. After
//! [`AuthSessionAdapter::teardown`] late settlements and events are ignored.

use crate::client::navigation::{MountRoute, Navigator, ROOT_PATH};
use crate::client::oidc::{EventSubscription, OidcClient, TokenEvent, TokenEventListener};
use crate::client::session::SessionState;
use crate::config::{ClientSettings, ProviderConfig};
use crate::error::{AuthError, ClientError};
use crate::user::User;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};

/// Pending adapter operation. Spawn it on the UI executor or await it directly.
pub type SessionTask = Pin<Box<dyn Future<Output = ()>>>;

/// Receives every new session snapshot.
pub type SessionObserver = Box<dyn Fn(&SessionState)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Ticket(u64);

#[derive(Clone, Copy, Debug)]
enum Redirect {
    SignIn,
    SignOut,
}

impl Redirect {
    fn error(self, err: ClientError) -> AuthError {
        match self {
            Self::SignIn => AuthError::SigninRedirect(err),
            Self::SignOut => AuthError::SignoutRedirect(err),
        }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignIn => f.write_str("sign-in redirect"),
            Self::SignOut => f.write_str("sign-out redirect"),
        }
    }
}

/// Bridges an [`OidcClient`] to observable session snapshots.
///
/// Handles are cheap to clone and share one session. The client's event
/// subscriptions are released by [`teardown`](Self::teardown), or when the
/// last handle and pending task are gone.
pub struct AuthSessionAdapter<C: OidcClient + 'static, N: Navigator + 'static> {
    inner: Rc<Inner<C, N>>,
}

impl<C: OidcClient + 'static, N: Navigator + 'static> Clone for AuthSessionAdapter<C, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct Inner<C: OidcClient + 'static, N: Navigator + 'static> {
    config: ProviderConfig,
    client: Rc<C>,
    navigator: N,
    state: RefCell<SessionState>,
    observer: RefCell<Option<SessionObserver>>,
    generation: Cell<u64>,
    mounted: Cell<bool>,
    torn_down: Cell<bool>,
    subscriptions: RefCell<Vec<EventSubscription<C>>>,
}

impl<C: OidcClient + 'static, N: Navigator + 'static> AuthSessionAdapter<C, N> {
    /// Creates the adapter and instantiates the client through `connect`.
    ///
    /// `connect` receives the settings mapped from `config`. Both token
    /// events are subscribed before this returns.
    pub fn new<F>(config: ProviderConfig, navigator: N, connect: F) -> Self
    where
        F: FnOnce(ClientSettings) -> C,
    {
        if let Err(err) = config.validate() {
            tracing::error!("Invalid OIDC provider configuration: {}", err);
        }

        let settings = config.client_settings();
        tracing::debug!(
            "Creating OIDC client: authority={}, redirect_uri={}, post_logout_redirect_uri={}",
            settings.authority,
            settings.redirect_uri,
            settings.post_logout_redirect_uri
        );
        let client = Rc::new(connect(settings));

        let inner = Rc::new_cyclic(|weak: &Weak<Inner<C, N>>| {
            let subscriptions = vec![
                EventSubscription::register(
                    &client,
                    TokenEvent::AccessTokenExpiring,
                    event_listener(weak, Inner::<C, N>::on_token_expiring),
                ),
                EventSubscription::register(
                    &client,
                    TokenEvent::AccessTokenExpired,
                    event_listener(weak, Inner::<C, N>::on_token_expired),
                ),
            ];

            Inner {
                config,
                client: Rc::clone(&client),
                navigator,
                state: RefCell::new(SessionState::default()),
                observer: RefCell::new(None),
                generation: Cell::new(0),
                mounted: Cell::new(false),
                torn_down: Cell::new(false),
                subscriptions: RefCell::new(subscriptions),
            }
        });

        Self { inner }
    }

    /// Registers the observer and immediately hands it the current snapshot.
    ///
    /// Replaces any previous observer. The observer must not call
    /// `set_observer` or `teardown` itself.
    pub fn set_observer(&self, observer: impl Fn(&SessionState) + 'static) {
        if self.inner.torn_down.get() {
            tracing::warn!("Ignoring observer registered after teardown");
            return;
        }
        *self.inner.observer.borrow_mut() = Some(Box::new(observer));
        let snapshot = self.snapshot();
        self.inner.notify(&snapshot);
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.inner.config
    }

    /// The wrapped client, e.g. for reading tokens of the current user.
    pub fn client(&self) -> &C {
        &self.inner.client
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }

    /// Runs mount-time initialization.
    ///
    /// Depending on the current location this completes the sign-in
    /// callback, completes the sign-out callback, or loads the stored user.
    /// Only the first call does anything.
    pub fn mount(&self) -> SessionTask {
        let inner = Rc::clone(&self.inner);
        if inner.torn_down.get() {
            tracing::warn!("Ignoring mount after teardown");
            return Box::pin(async {});
        }
        if inner.mounted.replace(true) {
            tracing::debug!("Session adapter already mounted");
            return Box::pin(async {});
        }

        tracing::info!("Loading OIDC session provider");
        let ticket = inner.begin();
        let location = inner.navigator.location();
        let route = MountRoute::classify(&inner.config, &location);
        tracing::debug!("Mount route {:?} for path {}", route, location.path);

        Box::pin(async move {
            match route {
                MountRoute::SigninCallback => inner.complete_signin(ticket).await,
                MountRoute::SignoutCallback => inner.complete_signout(ticket).await,
                MountRoute::Normal => inner.load_user(ticket).await,
            }
        })
    }

    /// Starts the sign-in redirect.
    ///
    /// `is_loading` is set before this returns. The state only changes again
    /// if the redirect could not be started.
    pub fn sign_in(&self) -> SessionTask {
        self.start_redirect(Redirect::SignIn)
    }

    /// Starts the sign-out redirect. See [`sign_in`](Self::sign_in).
    pub fn sign_out(&self) -> SessionTask {
        self.start_redirect(Redirect::SignOut)
    }

    /// Releases the event subscriptions and the observer.
    ///
    /// Operations still in flight settle without changing the state, but a
    /// completed callback still leaves its URL. Idempotent.
    pub fn teardown(&self) {
        if self.inner.torn_down.replace(true) {
            return;
        }
        tracing::debug!("Tearing down OIDC session adapter");

        self.inner.observer.borrow_mut().take();
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(subscriptions);
    }

    fn start_redirect(&self, redirect: Redirect) -> SessionTask {
        let inner = Rc::clone(&self.inner);
        if inner.torn_down.get() {
            tracing::warn!("Ignoring {} after teardown", redirect);
            return Box::pin(async {});
        }

        let ticket = inner.begin();
        Box::pin(async move {
            let result = match redirect {
                Redirect::SignIn => inner.client.signin_redirect().await,
                Redirect::SignOut => inner.client.signout_redirect().await,
            };

            match result {
                Ok(()) => tracing::info!("{} initiated", redirect),
                Err(err) => {
                    tracing::error!("{} failed: {}", redirect, err);
                    inner.settle(ticket, redirect, |state| {
                        state.with_error(redirect.error(err))
                    });
                }
            }
        })
    }
}

fn event_listener<C, N>(weak: &Weak<Inner<C, N>>, handler: fn(&Inner<C, N>)) -> TokenEventListener
where
    C: OidcClient + 'static,
    N: Navigator + 'static,
{
    let weak = weak.clone();
    Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
            handler(&inner);
        }
    })
}

impl<C: OidcClient + 'static, N: Navigator + 'static> Inner<C, N> {
    /// Takes a ticket for a new operation and publishes the loading state.
    fn begin(&self) -> Ticket {
        let ticket = Ticket(self.generation.get() + 1);
        self.generation.set(ticket.0);

        let next = self.state.borrow().loading();
        self.publish(next);
        ticket
    }

    /// Applies the settlement of `ticket` unless it was superseded or the
    /// adapter was torn down.
    fn settle(
        &self,
        ticket: Ticket,
        operation: impl fmt::Display,
        transition: impl FnOnce(&SessionState) -> SessionState,
    ) -> bool {
        if self.torn_down.get() {
            tracing::debug!("{} settled after teardown, ignoring", operation);
            return false;
        }
        if self.generation.get() != ticket.0 {
            tracing::debug!(
                "{} settled for superseded operation {:?}, ignoring",
                operation,
                ticket
            );
            return false;
        }

        let next = transition(&*self.state.borrow());
        self.publish(next);
        true
    }

    fn publish(&self, next: SessionState) {
        *self.state.borrow_mut() = next.clone();
        self.notify(&next);
    }

    fn notify(&self, state: &SessionState) {
        if let Some(observer) = self.observer.borrow().as_ref() {
            observer(state);
        }
    }

    async fn complete_signin(&self, ticket: Ticket) {
        match self.client.complete_signin_redirect().await {
            Ok(oidc_user) => {
                tracing::info!("Sign-in success for {}", oidc_user.profile.sub);
                let user = User::from(&oidc_user);
                self.settle(ticket, "sign-in callback", |_| SessionState::logged_in(user));
            }
            Err(err) => {
                tracing::error!("Sign-in callback failed: {}", err);
                self.settle(ticket, "sign-in callback", |_| {
                    SessionState::failed(AuthError::SigninCallback(err))
                });
            }
        }
        self.leave_callback_url();
    }

    async fn complete_signout(&self, ticket: Ticket) {
        match self.client.complete_signout_redirect().await {
            Ok(()) => {
                tracing::info!("Sign-out success");
                self.settle(ticket, "sign-out callback", |_| SessionState::logged_out());
            }
            Err(err) => {
                tracing::error!("Sign-out callback failed: {}", err);
                self.settle(ticket, "sign-out callback", |_| {
                    SessionState::failed(AuthError::SignoutCallback(err))
                });
            }
        }
        self.leave_callback_url();
    }

    async fn load_user(&self, ticket: Ticket) {
        match self.client.get_user().await {
            Ok(None) => {
                tracing::info!("User is not logged in");
                self.settle(ticket, "user query", |_| SessionState::logged_out());
            }
            Ok(Some(oidc_user)) if oidc_user.expired() => {
                tracing::info!("User login has expired");
                self.settle(ticket, "user query", |_| SessionState::logged_out());
            }
            Ok(Some(oidc_user)) => {
                tracing::debug!("Restored session for {}", oidc_user.profile.sub);
                let user = User::from(&oidc_user);
                self.settle(ticket, "user query", |_| SessionState::logged_in(user));
            }
            Err(err) => {
                tracing::error!("Failed to load current user: {}", err);
                self.settle(ticket, "user query", |_| {
                    SessionState::failed(AuthError::UserQuery(err))
                });
            }
        }
    }

    /// Replaces the callback URL so a reload does not process it again.
    ///
    /// Also runs after teardown: the callback was consumed either way.
    fn leave_callback_url(&self) {
        self.navigator.replace(ROOT_PATH);
    }

    fn on_token_expiring(&self) {
        if self.torn_down.get() {
            return;
        }
        tracing::debug!("Access token expiring");
        let next = self.state.borrow().token_expiring();
        self.publish(next);
    }

    fn on_token_expired(&self) {
        if self.torn_down.get() {
            return;
        }
        tracing::info!("Access token expired, clearing session");
        let next = self.state.borrow().token_expired();
        self.publish(next);
    }
}
