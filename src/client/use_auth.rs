//! Dioxus hooks exposing the OIDC session to the component tree.
//!
//! [`use_oidc_provider`] owns the [`AuthSessionAdapter`] for the lifetime of
//! the calling component and mirrors every session snapshot into a signal.
//! Descendants read it through [`use_oidc`].

use crate::client::adapter::AuthSessionAdapter;
use crate::client::navigation::PlatformNavigator;
use crate::client::oidc::OidcClient;
use crate::client::session::{Phase, SessionState};
#[cfg(target_arch = "wasm32")]
use crate::client::user_manager::UserManagerClient;
use crate::config::{ClientSettings, ProviderConfig};
use crate::error::AuthError;
use crate::user::User;

use dioxus::prelude::*;

/// Provides the OIDC session context to the component tree.
///
/// Must be called once, at the root of the authenticated part of the
/// application. `connect` builds the wrapped client from the derived
/// settings and runs only on the first render. Initialization starts once
/// the component is mounted; the session is torn down when it is dropped.
///
/// # Example
///
/// ```ignore
/// #[component]
/// pub fn App() -> Element {
///     let config = ProviderConfig::from_env_or_panic();
///     let auth = use_oidc_provider(config, UserManagerClient::new);
///     // ... rest of app
/// }
/// ```
pub fn use_oidc_provider<C, F>(config: ProviderConfig, connect: F) -> OidcContext
where
    C: OidcClient + 'static,
    F: FnOnce(ClientSettings) -> C,
{
    let state = use_signal(SessionState::default);

    let adapter = use_hook(move || {
        let adapter = AuthSessionAdapter::new(config, PlatformNavigator::default(), connect);
        adapter.set_observer(move |snapshot: &SessionState| {
            let mut state = state;
            // The first notification happens during render and matches the default.
            if *state.peek() != *snapshot {
                state.set(snapshot.clone());
            }
        });
        adapter
    });

    use_effect({
        let adapter = adapter.clone();
        move || {
            tracing::trace!("Mounting OIDC session");
            spawn(adapter.mount());
        }
    });

    use_drop({
        let adapter = adapter.clone();
        move || adapter.teardown()
    });

    let sign_in = {
        let adapter = adapter.clone();
        Callback::new(move |_: ()| {
            tracing::trace!("Sign-in requested");
            spawn(adapter.sign_in());
        })
    };

    let sign_out = Callback::new(move |_: ()| {
        tracing::trace!("Sign-out requested");
        spawn(adapter.sign_out());
    });

    let context = OidcContext {
        state,
        sign_in_action: sign_in,
        sign_out_action: sign_out,
    };

    use_context_provider(|| context)
}

/// Hook for accessing the OIDC session.
///
/// # Panics
///
/// Panics if called without `use_oidc_provider()` being called in an ancestor component.
pub fn use_oidc() -> OidcContext {
    use_context::<OidcContext>()
}

/// Context object returned by the OIDC hooks.
#[derive(Clone, Copy)]
pub struct OidcContext {
    state: Signal<SessionState>,
    sign_in_action: Callback<()>,
    sign_out_action: Callback<()>,
}

impl OidcContext {
    /// Returns the full current session snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().is_logged_in
    }

    pub fn error(&self) -> Option<AuthError> {
        self.state.read().error.clone()
    }

    pub fn is_error(&self) -> bool {
        self.state.read().is_error
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn is_token_expiring(&self) -> bool {
        self.state.read().is_token_expiring
    }

    pub fn phase(&self) -> Phase {
        self.state.read().phase()
    }

    /// Starts the sign-in redirect.
    pub fn sign_in(&self) {
        self.sign_in_action.call(());
    }

    /// Starts the sign-out redirect.
    pub fn sign_out(&self) {
        self.sign_out_action.call(());
    }

    /// Bundles the current state and both actions for a render function.
    pub fn view(&self) -> SessionView {
        let state = self.state.read();
        SessionView {
            user: state.user.clone(),
            is_logged_in: state.is_logged_in,
            error: state.error.clone(),
            is_error: state.is_error,
            is_loading: state.is_loading,
            is_token_expiring: state.is_token_expiring,
            sign_in: self.sign_in_action,
            sign_out: self.sign_out_action,
        }
    }
}

/// Values handed to the render function of [`OidcProvider`].
#[derive(Clone, PartialEq)]
pub struct SessionView {
    pub user: Option<User>,
    pub is_logged_in: bool,
    pub error: Option<AuthError>,
    pub is_error: bool,
    pub is_loading: bool,
    pub is_token_expiring: bool,
    pub sign_in: Callback<()>,
    pub sign_out: Callback<()>,
}

impl SessionView {
    pub fn phase(&self) -> Phase {
        SessionState {
            user: None,
            is_logged_in: self.is_logged_in,
            error: None,
            is_error: self.is_error,
            is_loading: self.is_loading,
            is_token_expiring: self.is_token_expiring,
        }
        .phase()
    }
}

/// Render-prop component backed by the browser `oidc-client` library.
///
/// `render` is called with the current [`SessionView`] on every session change.
///
/// # Example
///
/// ```ignore
/// rsx! {
///     OidcProvider {
///         config: ProviderConfig::from_env_or_panic(),
///         render: move |view: SessionView| rsx! { Home { view } },
///     }
/// }
/// ```
#[cfg(target_arch = "wasm32")]
#[component]
pub fn OidcProvider(config: ProviderConfig, render: Callback<SessionView, Element>) -> Element {
    let context = use_oidc_provider(config, UserManagerClient::new);
    render.call(context.view())
}
