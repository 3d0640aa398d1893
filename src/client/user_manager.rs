//! [`OidcClient`] backed by the JavaScript `oidc-client` library.
//!
//! The library's browser bundle (`oidc-client.min.js`) must be loaded by the
//! host page; it exposes the `Oidc` global this module binds to. Users cross
//! the boundary as JSON and are deserialized into [`OidcUser`].

use crate::client::oidc::{ListenerId, OidcClient, TokenEvent, TokenEventListener};
use crate::config::{ClientLogLevel, ClientSettings};
use crate::error::ClientError;
use crate::user::OidcUser;
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(js_namespace = Oidc)]
extern "C" {
    type UserManager;

    #[wasm_bindgen(constructor, catch)]
    fn new(settings: &JsValue) -> Result<UserManager, JsValue>;

    #[wasm_bindgen(method, catch, js_name = signinRedirect)]
    fn signin_redirect(this: &UserManager) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = signoutRedirect)]
    fn signout_redirect(this: &UserManager) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = signinRedirectCallback)]
    fn signin_redirect_callback(this: &UserManager) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = signoutRedirectCallback)]
    fn signout_redirect_callback(this: &UserManager) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getUser)]
    fn get_user(this: &UserManager) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn events(this: &UserManager) -> UserManagerEvents;

    type UserManagerEvents;

    #[wasm_bindgen(method, js_name = addAccessTokenExpiring)]
    fn add_access_token_expiring(this: &UserManagerEvents, callback: &js_sys::Function);

    #[wasm_bindgen(method, js_name = removeAccessTokenExpiring)]
    fn remove_access_token_expiring(this: &UserManagerEvents, callback: &js_sys::Function);

    #[wasm_bindgen(method, js_name = addAccessTokenExpired)]
    fn add_access_token_expired(this: &UserManagerEvents, callback: &js_sys::Function);

    #[wasm_bindgen(method, js_name = removeAccessTokenExpired)]
    fn remove_access_token_expired(this: &UserManagerEvents, callback: &js_sys::Function);
}

struct Manager {
    manager: UserManager,
    events: UserManagerEvents,
}

impl Manager {
    fn attach(&self, event: TokenEvent, callback: &js_sys::Function) {
        match event {
            TokenEvent::AccessTokenExpiring => self.events.add_access_token_expiring(callback),
            TokenEvent::AccessTokenExpired => self.events.add_access_token_expired(callback),
        }
    }

    fn detach(&self, event: TokenEvent, callback: &js_sys::Function) {
        match event {
            TokenEvent::AccessTokenExpiring => self.events.remove_access_token_expiring(callback),
            TokenEvent::AccessTokenExpired => self.events.remove_access_token_expired(callback),
        }
    }
}

/// Wrapper around an `Oidc.UserManager` instance.
///
/// If the library rejects the settings, the failure is kept and returned by
/// every operation, so it surfaces as session error state on mount.
pub struct UserManagerClient {
    manager: Result<Manager, ClientError>,
    listeners: RefCell<HashMap<ListenerId, (TokenEvent, Closure<dyn Fn()>)>>,
    next_listener: Cell<u64>,
}

impl UserManagerClient {
    /// Instantiates `Oidc.UserManager` with `settings`.
    pub fn new(settings: ClientSettings) -> Self {
        configure_library_logging(settings.log_level);

        let manager = create_manager(&settings);
        if let Err(err) = &manager {
            tracing::error!("Failed to create oidc-client UserManager: {}", err);
        }

        Self {
            manager,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
        }
    }

    fn manager(&self) -> Result<&UserManager, ClientError> {
        self.manager
            .as_ref()
            .map(|manager| &manager.manager)
            .map_err(Clone::clone)
    }
}

fn create_manager(settings: &ClientSettings) -> Result<Manager, ClientError> {
    let json = serde_json::to_string(settings)?;
    let js_settings = js_sys::JSON::parse(&json).map_err(|err| client_error(&err))?;
    let manager = UserManager::new(&js_settings).map_err(|err| client_error(&err))?;
    let events = manager.events();
    Ok(Manager { manager, events })
}

/// Points the library's `Log` at the console with the configured level.
fn configure_library_logging(level: ClientLogLevel) {
    let global = js_sys::global();
    let log = js_sys::Reflect::get(&global, &JsValue::from_str("Oidc"))
        .and_then(|oidc| js_sys::Reflect::get(&oidc, &JsValue::from_str("Log")));
    let console = js_sys::Reflect::get(&global, &JsValue::from_str("console"));

    match (log, console) {
        (Ok(log), Ok(console)) if log.is_object() => {
            let _ = js_sys::Reflect::set(&log, &JsValue::from_str("logger"), &console);
            let _ = js_sys::Reflect::set(
                &log,
                &JsValue::from_str("level"),
                &JsValue::from(level.as_number()),
            );
        }
        _ => tracing::warn!("Oidc.Log not found, library logging left unchanged"),
    }
}

fn client_error(value: &JsValue) -> ClientError {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return ClientError::new(String::from(err.message()));
    }
    match value.as_string() {
        Some(message) => ClientError::new(message),
        None => ClientError::new(format!("{:?}", value)),
    }
}

async fn settle(promise: Result<js_sys::Promise, JsValue>) -> Result<JsValue, ClientError> {
    let promise = promise.map_err(|err| client_error(&err))?;
    JsFuture::from(promise)
        .await
        .map_err(|err| client_error(&err))
}

fn user_from_js(value: &JsValue) -> Result<Option<OidcUser>, ClientError> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    let json = js_sys::JSON::stringify(value).map_err(|err| client_error(&err))?;
    let user = serde_json::from_str(&String::from(json))?;
    Ok(Some(user))
}

#[async_trait(?Send)]
impl OidcClient for UserManagerClient {
    async fn signin_redirect(&self) -> Result<(), ClientError> {
        settle(self.manager()?.signin_redirect()).await.map(|_| ())
    }

    async fn signout_redirect(&self) -> Result<(), ClientError> {
        settle(self.manager()?.signout_redirect()).await.map(|_| ())
    }

    async fn complete_signin_redirect(&self) -> Result<OidcUser, ClientError> {
        let value = settle(self.manager()?.signin_redirect_callback()).await?;
        user_from_js(&value)?
            .ok_or_else(|| ClientError::new("sign-in callback returned no user"))
    }

    async fn complete_signout_redirect(&self) -> Result<(), ClientError> {
        settle(self.manager()?.signout_redirect_callback())
            .await
            .map(|_| ())
    }

    async fn get_user(&self) -> Result<Option<OidcUser>, ClientError> {
        let value = settle(self.manager()?.get_user()).await?;
        user_from_js(&value)
    }

    fn add_listener(&self, event: TokenEvent, listener: TokenEventListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);

        // The same JS function must be passed to remove, so the closure is kept.
        let closure = Closure::<dyn Fn()>::new(move || listener());
        if let Ok(manager) = &self.manager {
            manager.attach(event, closure.as_ref().unchecked_ref());
        }
        self.listeners.borrow_mut().insert(id, (event, closure));
        id
    }

    fn remove_listener(&self, event: TokenEvent, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let registered = listeners
            .get(&id)
            .is_some_and(|(registered, _)| *registered == event);
        if !registered {
            return false;
        }

        if let Some((_, closure)) = listeners.remove(&id)
            && let Ok(manager) = &self.manager
        {
            manager.detach(event, closure.as_ref().unchecked_ref());
        }
        true
    }
}

impl Drop for UserManagerClient {
    fn drop(&mut self) {
        let listeners = std::mem::take(self.listeners.get_mut());
        if let Ok(manager) = &self.manager {
            for (event, closure) in listeners.values() {
                manager.detach(*event, closure.as_ref().unchecked_ref());
            }
        }
    }
}
