//! Navigation access for mount-time routing.
//!
//! The adapter reads the current location once on mount and, after a
//! redirect callback has been processed, replaces the current history entry
//! with the root path so that a reload does not process the callback again.

use crate::config::ProviderConfig;
use std::cell::RefCell;
use std::rc::Rc;

/// Path every processed callback is replaced with.
pub const ROOT_PATH: &str = "/";

/// Current navigation target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    /// Path component, e.g. `/login_callback`
    pub path: String,
    /// Fragment without the leading `#`, if any
    pub fragment: Option<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fragment: None,
        }
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Returns true if the location carries a non-empty fragment.
    pub fn has_fragment(&self) -> bool {
        self.fragment
            .as_deref()
            .is_some_and(|fragment| !fragment.is_empty())
    }
}

/// Source of the current location and sink for history replacement.
pub trait Navigator {
    fn location(&self) -> Location;

    /// Replaces the current history entry with `path` without adding a new one.
    fn replace(&self, path: &str);
}

/// Branch taken by mount-time initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountRoute {
    /// The provider redirected back after sign-in.
    SigninCallback,
    /// The provider redirected back after sign-out.
    SignoutCallback,
    /// Ordinary page load.
    Normal,
}

impl MountRoute {
    /// Decides which initialization branch applies to `location`.
    ///
    /// Without a configured login path the sign-in callback is recognised by
    /// the fragment the provider appends to the origin.
    pub fn classify(config: &ProviderConfig, location: &Location) -> Self {
        let is_signin_callback = match config.login_redirect_path.as_deref() {
            Some(path) => location.path == path,
            None => location.has_fragment(),
        };
        if is_signin_callback {
            return Self::SigninCallback;
        }

        if config
            .logout_redirect_path
            .as_deref()
            .is_some_and(|path| location.path == path)
        {
            return Self::SignoutCallback;
        }

        Self::Normal
    }
}

/// In-memory navigator for non-browser targets and tests.
///
/// Clones share the same location.
#[derive(Clone, Debug, Default)]
pub struct MemoryNavigator {
    inner: Rc<RefCell<MemoryHistory>>,
}

#[derive(Debug, Default)]
struct MemoryHistory {
    location: Location,
    replacements: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(location: Location) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryHistory {
                location,
                replacements: Vec::new(),
            })),
        }
    }

    /// Paths passed to [`Navigator::replace`], oldest first.
    pub fn replacements(&self) -> Vec<String> {
        self.inner.borrow().replacements.clone()
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> Location {
        self.inner.borrow().location.clone()
    }

    fn replace(&self, path: &str) {
        let mut history = self.inner.borrow_mut();
        history.location = Location::new(path);
        history.replacements.push(path.to_string());
    }
}

/// Navigator backed by `window.location` and `window.history`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

#[cfg(target_arch = "wasm32")]
impl Navigator for BrowserNavigator {
    fn location(&self) -> Location {
        let Some(location) = web_sys::window().map(|w| w.location()) else {
            tracing::error!("Failed to get window location");
            return Location::new(ROOT_PATH);
        };

        let path = location.pathname().unwrap_or_else(|_| ROOT_PATH.to_string());
        let fragment = location
            .hash()
            .ok()
            .map(|hash| hash.trim_start_matches('#').to_string())
            .filter(|hash| !hash.is_empty());

        Location { path, fragment }
    }

    fn replace(&self, path: &str) {
        let history = web_sys::window().and_then(|w| w.history().ok());
        match history {
            Some(history) => {
                if let Err(err) =
                    history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(path))
                {
                    tracing::warn!("Failed to replace history entry: {:?}", err);
                }
            }
            None => tracing::error!("Failed to get window history"),
        }
    }
}

/// Navigator used by the Dioxus hooks on the current target.
#[cfg(target_arch = "wasm32")]
pub type PlatformNavigator = BrowserNavigator;

/// Navigator used by the Dioxus hooks on the current target.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformNavigator = MemoryNavigator;
