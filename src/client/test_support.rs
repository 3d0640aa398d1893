//! Scripted test doubles for the wrapped client.

use crate::client::oidc::{ListenerId, OidcClient, TokenEvent, TokenEventListener};
use crate::config::ClientSettings;
use crate::error::ClientError;
use crate::user::{OidcUser, Profile};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use tokio::sync::oneshot;

/// Reply to one client call: either settled up front or released later by the test.
pub enum Reply<T> {
    Ready(Result<T, ClientError>),
    Gated(oneshot::Receiver<Result<T, ClientError>>),
}

impl<T> Reply<T> {
    /// A reply the test settles through the returned sender.
    pub fn gated() -> (Self, oneshot::Sender<Result<T, ClientError>>) {
        let (tx, rx) = oneshot::channel();
        (Self::Gated(rx), tx)
    }

    async fn settle(reply: Option<Self>, call: &str) -> Result<T, ClientError> {
        match reply {
            Some(Self::Ready(result)) => result,
            Some(Self::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::new(format!("{} gate dropped", call)))),
            None => Err(ClientError::new(format!("no scripted reply for {}", call))),
        }
    }
}

#[derive(Default)]
struct FakeState {
    settings: RefCell<Option<ClientSettings>>,
    calls: RefCell<Vec<&'static str>>,
    signin_redirect: RefCell<VecDeque<Reply<()>>>,
    signout_redirect: RefCell<VecDeque<Reply<()>>>,
    complete_signin: RefCell<VecDeque<Reply<OidcUser>>>,
    complete_signout: RefCell<VecDeque<Reply<()>>>,
    get_user: RefCell<VecDeque<Reply<Option<OidcUser>>>>,
    listeners: RefCell<BTreeMap<ListenerId, (TokenEvent, TokenEventListener)>>,
    next_listener: Cell<u64>,
}

/// Client double whose replies are queued by the test.
///
/// Clones share state, so a test can keep one handle while the adapter owns another.
#[derive(Clone, Default)]
pub struct FakeClient {
    state: Rc<FakeState>,
}

impl FakeClient {
    /// Constructor shaped like the adapter's client factory.
    pub fn connect(&self, settings: ClientSettings) -> Self {
        *self.state.settings.borrow_mut() = Some(settings);
        self.clone()
    }

    pub fn settings(&self) -> Option<ClientSettings> {
        self.state.settings.borrow().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.calls.borrow().clone()
    }

    pub fn push_signin_redirect(&self, reply: Reply<()>) {
        self.state.signin_redirect.borrow_mut().push_back(reply);
    }

    pub fn push_signout_redirect(&self, reply: Reply<()>) {
        self.state.signout_redirect.borrow_mut().push_back(reply);
    }

    pub fn push_complete_signin(&self, reply: Reply<OidcUser>) {
        self.state.complete_signin.borrow_mut().push_back(reply);
    }

    pub fn push_complete_signout(&self, reply: Reply<()>) {
        self.state.complete_signout.borrow_mut().push_back(reply);
    }

    pub fn push_get_user(&self, reply: Reply<Option<OidcUser>>) {
        self.state.get_user.borrow_mut().push_back(reply);
    }

    /// Invokes every listener registered for `event`.
    pub fn fire(&self, event: TokenEvent) {
        let listeners: Vec<TokenEventListener> = self
            .state
            .listeners
            .borrow()
            .values()
            .filter(|(registered, _)| *registered == event)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self, event: TokenEvent) -> usize {
        self.state
            .listeners
            .borrow()
            .values()
            .filter(|(registered, _)| *registered == event)
            .count()
    }

    fn record(&self, call: &'static str) {
        self.state.calls.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl OidcClient for FakeClient {
    async fn signin_redirect(&self) -> Result<(), ClientError> {
        self.record("signin_redirect");
        let reply = self.state.signin_redirect.borrow_mut().pop_front();
        Reply::settle(reply, "signin_redirect").await
    }

    async fn signout_redirect(&self) -> Result<(), ClientError> {
        self.record("signout_redirect");
        let reply = self.state.signout_redirect.borrow_mut().pop_front();
        Reply::settle(reply, "signout_redirect").await
    }

    async fn complete_signin_redirect(&self) -> Result<OidcUser, ClientError> {
        self.record("complete_signin_redirect");
        let reply = self.state.complete_signin.borrow_mut().pop_front();
        Reply::settle(reply, "complete_signin_redirect").await
    }

    async fn complete_signout_redirect(&self) -> Result<(), ClientError> {
        self.record("complete_signout_redirect");
        let reply = self.state.complete_signout.borrow_mut().pop_front();
        Reply::settle(reply, "complete_signout_redirect").await
    }

    async fn get_user(&self) -> Result<Option<OidcUser>, ClientError> {
        self.record("get_user");
        let reply = self.state.get_user.borrow_mut().pop_front();
        Reply::settle(reply, "get_user").await
    }

    fn add_listener(&self, event: TokenEvent, listener: TokenEventListener) -> ListenerId {
        let id = ListenerId(self.state.next_listener.get());
        self.state.next_listener.set(id.0 + 1);
        self.state
            .listeners
            .borrow_mut()
            .insert(id, (event, listener));
        id
    }

    fn remove_listener(&self, event: TokenEvent, id: ListenerId) -> bool {
        let mut listeners = self.state.listeners.borrow_mut();
        let registered = listeners
            .get(&id)
            .is_some_and(|(registered, _)| *registered == event);
        if registered {
            listeners.remove(&id);
        }
        registered
    }
}

/// A signed-in user expiring an hour from now.
pub fn valid_user(sub: &str) -> OidcUser {
    OidcUser {
        id_token: format!("id-token-{}", sub),
        access_token: format!("access-token-{}", sub),
        token_type: "Bearer".to_string(),
        scope: "openid profile email".to_string(),
        session_state: None,
        expires_at: Some(crate::user::current_timestamp() + 3600),
        profile: Profile {
            sub: sub.to_string(),
            name: Some("Test User".to_string()),
            email: Some("test@example.com".to_string()),
            ..Profile::default()
        },
    }
}

/// A user whose access token expired long ago.
pub fn expired_user(sub: &str) -> OidcUser {
    OidcUser {
        expires_at: Some(1),
        ..valid_user(sub)
    }
}
