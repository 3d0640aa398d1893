//! Client-side session management on top of an OIDC client library.
//!
//! - `oidc`: the seam to the wrapped client and its token events
//! - `adapter`: the session state machine driving the client
//! - `session`: immutable session snapshots
//! - `navigation`: location access for mount-time routing
//! - `user_manager`: binding to the browser `oidc-client` library (WASM only)
//! - `use_auth`: Dioxus hooks and the render-prop provider
//!
//! # Example
//!
//! ```rust,ignore
//! use dxoidc::client::{use_oidc, use_oidc_provider, UserManagerClient};
//!
//! // At the application root
//! let auth = use_oidc_provider(ProviderConfig::from_env_or_panic(), UserManagerClient::new);
//!
//! // In any descendant
//! let auth = use_oidc();
//! if !auth.is_logged_in() {
//!     auth.sign_in();
//! }
//! ```

pub mod adapter;
pub mod navigation;
pub mod oidc;
pub mod session;
pub mod use_auth;
#[cfg(target_arch = "wasm32")]
pub mod user_manager;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapter::{AuthSessionAdapter, SessionObserver, SessionTask};
#[cfg(target_arch = "wasm32")]
pub use navigation::BrowserNavigator;
pub use navigation::{Location, MemoryNavigator, MountRoute, Navigator, PlatformNavigator};
pub use oidc::{EventSubscription, ListenerId, OidcClient, TokenEvent, TokenEventListener};
pub use session::{Phase, SessionState};
#[cfg(target_arch = "wasm32")]
pub use use_auth::OidcProvider;
pub use use_auth::{OidcContext, SessionView, use_oidc, use_oidc_provider};
#[cfg(target_arch = "wasm32")]
pub use user_manager::UserManagerClient;
