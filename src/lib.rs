//! # dxoidc
//!
//! OpenID Connect session management for Dioxus web applications.
//!
//! This crate wraps a browser OIDC client library (`oidc-client`) and exposes
//! its session to the component tree as a small, render-ready state: the
//! current user, whether they are logged in, whether an operation is in
//! flight, the last error, and whether the access token is about to expire.
//!
//! ## Overview
//!
//! - **Configuration** (`ProviderConfig`) - authority, client id, redirect paths
//! - **Users** (`OidcUser`, `User`) - the client's record and the profile views see
//! - **Session adapter** (`AuthSessionAdapter`) - drives the client and publishes snapshots
//! - **Dioxus integration** (`use_oidc_provider`, `use_oidc`, `OidcProvider`)
//!
//! On mount the adapter decides what the current page load is: the return
//! from a sign-in redirect, the return from a sign-out redirect, or an
//! ordinary load. Callbacks are completed with the client and the address
//! bar is reset to `/`; ordinary loads restore any stored, unexpired user.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dioxus::prelude::*;
//! use dxoidc::{OidcProvider, ProviderConfig, SessionView};
//!
//! #[component]
//! fn App() -> Element {
//!     rsx! {
//!         OidcProvider {
//!             config: ProviderConfig::from_env_or_panic(),
//!             render: move |view: SessionView| rsx! {
//!                 if view.is_logged_in {
//!                     button { onclick: move |_| view.sign_out.call(()), "Sign Out" }
//!                 } else {
//!                     button { onclick: move |_| view.sign_in.call(()), "Sign In" }
//!                 }
//!             },
//!         }
//!     }
//! }
//! ```
//!
//! ## Configuration
//!
//! `ProviderConfig::from_env()` reads values baked in at compile time by the
//! build script from the environment, `.env`, or `.env.example`:
//!
//! | Variable | Required |
//! |----------|----------|
//! | `OIDC_AUTHORITY` | yes |
//! | `OIDC_CLIENT_ID` | yes |
//! | `OIDC_CLIENT_ORIGIN` | yes |
//! | `OIDC_RESPONSE_TYPE` | yes |
//! | `OIDC_SCOPE` | yes |
//! | `OIDC_LOGIN_REDIRECT_PATH` | no |
//! | `OIDC_LOGOUT_REDIRECT_PATH` | no |
//! | `OIDC_TOKEN_EXPIRY_WARNING_SECONDS` | no |
//! | `OIDC_CLIENT_LOG_LEVEL` | no |
//!
//! ## Platform Compatibility
//!
//! | Item | WASM (browser) | Native |
//! |------|----------------|--------|
//! | Config, users, session adapter | ✅ | ✅ |
//! | Dioxus hooks | ✅ | ✅ (in-memory navigation) |
//! | `UserManagerClient`, `OidcProvider` | ✅ | ❌ |
//!
//! On native targets an [`OidcClient`] implementation must be supplied to
//! `use_oidc_provider` by the application.

pub mod config;
pub mod error;
pub mod user;

pub mod client;

pub use client::{
    AuthSessionAdapter, OidcClient, OidcContext, Phase, SessionState, SessionView, TokenEvent,
    use_oidc, use_oidc_provider,
};
#[cfg(target_arch = "wasm32")]
pub use client::{OidcProvider, UserManagerClient};
pub use config::{ClientLogLevel, ClientSettings, ProviderConfig};
pub use error::{AuthError, ClientError, ConfigError};
pub use user::{OidcUser, Profile, User};
