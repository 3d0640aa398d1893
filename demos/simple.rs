//! Minimal sign-in page.
//!
//! Serve with `dx serve --example simple --features web` after loading the
//! `oidc-client` browser bundle in the host page.

#[cfg(target_arch = "wasm32")]
use dioxus::prelude::*;
#[cfg(target_arch = "wasm32")]
use dxoidc::{Phase, SessionView};

#[cfg(target_arch = "wasm32")]
fn main() {
    dioxus::launch(App);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    println!("This demo runs in the browser: dx serve --example simple --features web");
}

#[cfg(target_arch = "wasm32")]
#[component]
fn App() -> Element {
    let config = dxoidc::ProviderConfig::from_env_or_panic();
    rsx! {
        dxoidc::OidcProvider {
            config,
            render: move |view: SessionView| rsx! { Home { view } },
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[component]
fn Home(view: SessionView) -> Element {
    let sign_in = view.sign_in;
    let sign_out = view.sign_out;

    match view.phase() {
        Phase::Error => {
            let message = view.error.map(|err| err.to_string()).unwrap_or_default();
            rsx! {
                p { "There is an Error" }
                "{message}"
            }
        }
        Phase::Loading => rsx! { p { "Is Loading..." } },
        Phase::LoggedOut => rsx! {
            p { "User is Not Logged In" }
            button { onclick: move |_| sign_in.call(()), "Sign In" }
        },
        Phase::LoggedIn | Phase::TokenExpiring => {
            let name = view.user.map(|user| user.display_name()).unwrap_or_default();
            rsx! {
                p { "User is Logged In" }
                p { "User: {name}" }
                if view.is_token_expiring {
                    p { "Your session is about to expire" }
                }
                button { onclick: move |_| sign_out.call(()), "Sign Out" }
            }
        }
    }
}
