//! OpenID Connect provider configuration.
//!
//! [`ProviderConfig`] is supplied once when the session adapter is created and
//! never changes afterwards. The adapter maps it into the wrapped client's
//! [`ClientSettings`], whose serialized form uses the key names expected by
//! the JavaScript `oidc-client` library.

use crate::client::navigation::ROOT_PATH;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lead time, in seconds, of the token-expiring notification when none is configured.
pub const DEFAULT_TOKEN_EXPIRY_WARNING_SECONDS: u32 = 60;

/// Verbosity of the wrapped client library's own console logger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientLogLevel {
    None,
    #[default]
    Error,
    Warn,
    Info,
    Debug,
}

impl ClientLogLevel {
    /// Numeric level as defined by `oidc-client`'s `Log` object.
    pub fn as_number(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Error => 1,
            Self::Warn => 2,
            Self::Info => 3,
            Self::Debug => 4,
        }
    }
}

impl FromStr for ClientLogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(ConfigError::InvalidLogLevel(value.to_string())),
        }
    }
}

/// Provider configuration for the session adapter.
///
/// # Fields
///
/// - `authority`: OpenID Connect issuer URL (e.g., "https://login.example.com/")
/// - `client_id`: registered client identifier
/// - `client_origin`: origin the application is served from (e.g., "http://localhost:8080")
/// - `login_redirect_path` / `logout_redirect_path`: optional callback paths;
///   without a login path the provider answers on the origin and the
///   callback is recognised by its URL fragment
/// - `response_type`, `scope`: passed through to the provider
/// - `token_expiry_warning_seconds`: lead time of the expiring notification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    pub authority: String,

    pub client_id: String,

    pub client_origin: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_redirect_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout_redirect_path: Option<String>,

    pub response_type: String,

    pub scope: String,

    /// `None` and `Some(0)` both mean [`DEFAULT_TOKEN_EXPIRY_WARNING_SECONDS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expiry_warning_seconds: Option<u32>,

    #[serde(default)]
    pub client_log_level: ClientLogLevel,
}

/// Settings handed to the wrapped client when it is instantiated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    pub authority: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub response_type: String,
    pub scope: String,
    #[serde(rename = "accessTokenExpiringNotificationTime")]
    pub access_token_expiring_notification_time: u32,
    #[serde(skip)]
    pub log_level: ClientLogLevel,
}

impl ProviderConfig {
    /// Creates a fragment-based configuration: both redirects return to the origin.
    ///
    /// # Example
    ///
    /// ```
    /// # use dxoidc::ProviderConfig;
    /// let config = ProviderConfig::new(
    ///     "https://login.example.com/",
    ///     "spa",
    ///     "http://localhost:8080",
    ///     "id_token token",
    ///     "openid profile email",
    /// );
    /// assert!(config.login_redirect_path.is_none());
    /// assert_eq!(config.expiry_warning_seconds(), 60);
    /// ```
    pub fn new(
        authority: impl Into<String>,
        client_id: impl Into<String>,
        client_origin: impl Into<String>,
        response_type: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            authority: authority.into(),
            client_id: client_id.into(),
            client_origin: client_origin.into(),
            login_redirect_path: None,
            logout_redirect_path: None,
            response_type: response_type.into(),
            scope: scope.into(),
            token_expiry_warning_seconds: None,
            client_log_level: ClientLogLevel::default(),
        }
    }

    /// Sets distinct login and logout callback paths.
    ///
    /// # Example
    ///
    /// ```
    /// # use dxoidc::ProviderConfig;
    /// let config = ProviderConfig::new(
    ///     "https://login.example.com/",
    ///     "spa",
    ///     "http://localhost:8080",
    ///     "code",
    ///     "openid",
    /// )
    /// .with_redirect_paths("/login_callback", "/logout_callback");
    /// assert_eq!(config.redirect_uri(), "http://localhost:8080/login_callback");
    /// ```
    pub fn with_redirect_paths(
        mut self,
        login_redirect_path: impl Into<String>,
        logout_redirect_path: impl Into<String>,
    ) -> Self {
        self.login_redirect_path = Some(login_redirect_path.into());
        self.logout_redirect_path = Some(logout_redirect_path.into());
        self
    }

    pub fn with_token_expiry_warning(mut self, seconds: u32) -> Self {
        self.token_expiry_warning_seconds = Some(seconds);
        self
    }

    pub fn with_client_log_level(mut self, level: ClientLogLevel) -> Self {
        self.client_log_level = level;
        self
    }

    /// Loads the configuration from compile-time environment variables.
    ///
    /// Required:
    /// - `OIDC_AUTHORITY`
    /// - `OIDC_CLIENT_ID`
    /// - `OIDC_CLIENT_ORIGIN`
    /// - `OIDC_RESPONSE_TYPE`
    /// - `OIDC_SCOPE`
    ///
    /// Optional:
    /// - `OIDC_LOGIN_REDIRECT_PATH`
    /// - `OIDC_LOGOUT_REDIRECT_PATH`
    /// - `OIDC_TOKEN_EXPIRY_WARNING_SECONDS`
    /// - `OIDC_CLIENT_LOG_LEVEL` (`none`, `error`, `warn`, `info` or `debug`)
    ///
    /// Unparsable optional values are logged and replaced by their defaults.
    ///
    /// Returns `None` if any required variable was not set at compile time.
    pub fn from_env() -> Option<Self> {
        let authority = option_env!("OIDC_AUTHORITY")?;
        let client_id = option_env!("OIDC_CLIENT_ID")?;
        let client_origin = option_env!("OIDC_CLIENT_ORIGIN")?;
        let response_type = option_env!("OIDC_RESPONSE_TYPE")?;
        let scope = option_env!("OIDC_SCOPE")?;

        Some(Self {
            authority: authority.to_string(),
            client_id: client_id.to_string(),
            client_origin: client_origin.to_string(),
            login_redirect_path: option_env!("OIDC_LOGIN_REDIRECT_PATH").map(str::to_string),
            logout_redirect_path: option_env!("OIDC_LOGOUT_REDIRECT_PATH").map(str::to_string),
            response_type: response_type.to_string(),
            scope: scope.to_string(),
            token_expiry_warning_seconds: parse_expiry_warning(option_env!(
                "OIDC_TOKEN_EXPIRY_WARNING_SECONDS"
            )),
            client_log_level: parse_log_level(option_env!("OIDC_CLIENT_LOG_LEVEL")),
        })
    }

    /// Loads and validates the configuration from compile-time environment variables.
    ///
    /// # Panics
    ///
    /// Panics if a required variable was not set at compile time or if the
    /// resulting configuration does not pass [`ProviderConfig::validate`].
    pub fn from_env_or_panic() -> Self {
        let config = Self::from_env().expect(
            "OIDC configuration not found. Please set the following environment variables at compile time:\n\
             - OIDC_AUTHORITY\n\
             - OIDC_CLIENT_ID\n\
             - OIDC_CLIENT_ORIGIN\n\
             - OIDC_RESPONSE_TYPE\n\
             - OIDC_SCOPE\n\n\
             Optional: OIDC_LOGIN_REDIRECT_PATH, OIDC_LOGOUT_REDIRECT_PATH, OIDC_TOKEN_EXPIRY_WARNING_SECONDS, OIDC_CLIENT_LOG_LEVEL.",
        );
        if let Err(err) = config.validate() {
            panic!("invalid OIDC configuration: {}", err);
        }
        config
    }

    /// Checks the configuration for values the provider would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authority.trim().is_empty() {
            return Err(ConfigError::Missing("authority"));
        }
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("client_id"));
        }
        if self.response_type.trim().is_empty() {
            return Err(ConfigError::Missing("response_type"));
        }
        if !(self.client_origin.starts_with("http://") || self.client_origin.starts_with("https://"))
        {
            return Err(ConfigError::InvalidOrigin(self.client_origin.clone()));
        }

        for path in [&self.login_redirect_path, &self.logout_redirect_path]
            .into_iter()
            .flatten()
        {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidRedirectPath(path.clone()));
            }
            // Processed callbacks are replaced with the root path, which must not be a callback.
            if path == ROOT_PATH {
                return Err(ConfigError::RootRedirectPath(path.clone()));
            }
        }

        if let (Some(login), Some(logout)) = (&self.login_redirect_path, &self.logout_redirect_path)
            && login == logout
        {
            return Err(ConfigError::DuplicateRedirectPath(login.clone()));
        }

        Ok(())
    }

    /// Effective lead time of the token-expiring notification.
    pub fn expiry_warning_seconds(&self) -> u32 {
        match self.token_expiry_warning_seconds {
            Some(seconds) if seconds > 0 => seconds,
            _ => DEFAULT_TOKEN_EXPIRY_WARNING_SECONDS,
        }
    }

    /// URI the provider sends the browser back to after sign-in.
    pub fn redirect_uri(&self) -> String {
        self.origin_with(self.login_redirect_path.as_deref())
    }

    /// URI the provider sends the browser back to after sign-out.
    pub fn post_logout_redirect_uri(&self) -> String {
        self.origin_with(self.logout_redirect_path.as_deref())
    }

    /// Maps this configuration into the wrapped client's settings.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            authority: self.authority.clone(),
            client_id: self.client_id.clone(),
            redirect_uri: self.redirect_uri(),
            post_logout_redirect_uri: self.post_logout_redirect_uri(),
            response_type: self.response_type.clone(),
            scope: self.scope.clone(),
            access_token_expiring_notification_time: self.expiry_warning_seconds(),
            log_level: self.client_log_level,
        }
    }

    fn origin_with(&self, path: Option<&str>) -> String {
        match path {
            Some(path) => format!("{}{}", self.client_origin.trim_end_matches('/'), path),
            None => self.client_origin.clone(),
        }
    }
}

fn parse_expiry_warning(value: Option<&str>) -> Option<u32> {
    let value = value?;
    match value.trim().parse() {
        Ok(seconds) => Some(seconds),
        Err(_) => {
            tracing::warn!(
                "Ignoring non-numeric OIDC_TOKEN_EXPIRY_WARNING_SECONDS {:?}, using {} seconds",
                value,
                DEFAULT_TOKEN_EXPIRY_WARNING_SECONDS
            );
            None
        }
    }
}

fn parse_log_level(value: Option<&str>) -> ClientLogLevel {
    let Some(value) = value else {
        return ClientLogLevel::default();
    };
    value.parse().unwrap_or_else(|err| {
        tracing::warn!("{}, using the default", err);
        ClientLogLevel::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment_config() -> ProviderConfig {
        ProviderConfig::new(
            "https://login.example.com/",
            "implicit",
            "http://localhost:3000",
            "id_token token",
            "openid email profile",
        )
    }

    fn path_config() -> ProviderConfig {
        fragment_config().with_redirect_paths("/login_callback", "/logout_callback")
    }

    #[test]
    fn test_new_has_no_redirect_paths() {
        let config = fragment_config();
        assert_eq!(config.authority, "https://login.example.com/");
        assert_eq!(config.client_id, "implicit");
        assert!(config.login_redirect_path.is_none());
        assert!(config.logout_redirect_path.is_none());
        assert_eq!(config.client_log_level, ClientLogLevel::Error);
    }

    #[test]
    fn test_redirect_uris_without_paths_use_origin() {
        let config = fragment_config();
        assert_eq!(config.redirect_uri(), "http://localhost:3000");
        assert_eq!(config.post_logout_redirect_uri(), "http://localhost:3000");
    }

    #[test]
    fn test_redirect_uris_with_paths() {
        let config = path_config();
        assert_eq!(config.redirect_uri(), "http://localhost:3000/login_callback");
        assert_eq!(
            config.post_logout_redirect_uri(),
            "http://localhost:3000/logout_callback"
        );
    }

    #[test]
    fn test_redirect_uri_trims_trailing_slash_of_origin() {
        let mut config = path_config();
        config.client_origin = "http://localhost:3000/".to_string();
        assert_eq!(config.redirect_uri(), "http://localhost:3000/login_callback");
    }

    #[test]
    fn test_expiry_warning_defaults_to_sixty_seconds() {
        assert_eq!(fragment_config().expiry_warning_seconds(), 60);
        assert_eq!(
            fragment_config()
                .with_token_expiry_warning(0)
                .expiry_warning_seconds(),
            60
        );
        assert_eq!(
            fragment_config()
                .with_token_expiry_warning(300)
                .expiry_warning_seconds(),
            300
        );
    }

    #[test]
    fn test_client_settings_mapping() {
        let settings = path_config()
            .with_token_expiry_warning(120)
            .with_client_log_level(ClientLogLevel::Debug)
            .client_settings();

        assert_eq!(settings.authority, "https://login.example.com/");
        assert_eq!(settings.client_id, "implicit");
        assert_eq!(settings.redirect_uri, "http://localhost:3000/login_callback");
        assert_eq!(
            settings.post_logout_redirect_uri,
            "http://localhost:3000/logout_callback"
        );
        assert_eq!(settings.response_type, "id_token token");
        assert_eq!(settings.scope, "openid email profile");
        assert_eq!(settings.access_token_expiring_notification_time, 120);
        assert_eq!(settings.log_level, ClientLogLevel::Debug);
    }

    #[test]
    fn test_client_settings_serialize_with_library_key_names() {
        let json = serde_json::to_value(path_config().client_settings()).unwrap();
        assert_eq!(json["client_id"], "implicit");
        assert_eq!(json["post_logout_redirect_uri"], "http://localhost:3000/logout_callback");
        assert_eq!(json["accessTokenExpiringNotificationTime"], 60);
        assert!(json.get("log_level").is_none());
    }

    #[test]
    fn test_validate_accepts_valid_configs() {
        assert!(fragment_config().validate().is_ok());
        assert!(path_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_values() {
        let mut config = path_config();
        config.client_id = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::Missing("client_id")));

        let mut config = path_config();
        config.authority = String::new();
        assert_eq!(config.validate(), Err(ConfigError::Missing("authority")));
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let mut config = path_config();
        config.client_origin = "localhost:3000".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOrigin(_))
        ));
    }

    #[test]
    fn test_validate_rejects_relative_redirect_path() {
        let config = fragment_config().with_redirect_paths("login_callback", "/logout_callback");
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRedirectPath("login_callback".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_identical_redirect_paths() {
        let config = fragment_config().with_redirect_paths("/callback", "/callback");
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateRedirectPath("/callback".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_root_redirect_path() {
        let config = fragment_config().with_redirect_paths("/", "/logout_callback");
        assert_eq!(
            config.validate(),
            Err(ConfigError::RootRedirectPath("/".to_string()))
        );

        let config = fragment_config().with_redirect_paths("/login_callback", "/");
        assert_eq!(
            config.validate(),
            Err(ConfigError::RootRedirectPath("/".to_string()))
        );
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{
            "authority": "https://login.example.com/",
            "client_id": "spa",
            "client_origin": "http://localhost:8080",
            "response_type": "code",
            "scope": "openid"
        }"#;

        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert!(config.login_redirect_path.is_none());
        assert!(config.token_expiry_warning_seconds.is_none());
        assert_eq!(config.client_log_level, ClientLogLevel::Error);
    }

    #[test]
    fn test_serialization() {
        let config = path_config().with_token_expiry_warning(90);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ProviderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_log_level_numbers() {
        assert_eq!(ClientLogLevel::None.as_number(), 0);
        assert_eq!(ClientLogLevel::Error.as_number(), 1);
        assert_eq!(ClientLogLevel::Debug.as_number(), 4);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("debug".parse::<ClientLogLevel>(), Ok(ClientLogLevel::Debug));
        assert_eq!(" WARN ".parse::<ClientLogLevel>(), Ok(ClientLogLevel::Warn));
        assert_eq!("none".parse::<ClientLogLevel>(), Ok(ClientLogLevel::None));
        assert_eq!(
            "verbose".parse::<ClientLogLevel>(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    }

    #[test]
    fn test_parse_expiry_warning() {
        assert_eq!(parse_expiry_warning(None), None);
        assert_eq!(parse_expiry_warning(Some("90")), Some(90));
        assert_eq!(parse_expiry_warning(Some(" 30 ")), Some(30));
        assert_eq!(parse_expiry_warning(Some("1m")), None);
    }

    #[test]
    fn test_parse_log_level_falls_back_to_default() {
        assert_eq!(parse_log_level(None), ClientLogLevel::Error);
        assert_eq!(parse_log_level(Some("info")), ClientLogLevel::Info);
        assert_eq!(parse_log_level(Some("chatty")), ClientLogLevel::Error);
    }

    #[test]
    fn test_from_env() {
        // Populated when build.rs found a .env or .env.example file
        if let Some(config) = ProviderConfig::from_env() {
            assert!(!config.authority.is_empty());
            assert!(!config.client_id.is_empty());
            assert!(!config.scope.is_empty());
        }
    }

    #[test]
    fn test_from_env_or_panic() {
        if let Some(config) = ProviderConfig::from_env()
            && config.validate().is_ok()
        {
            let loaded = ProviderConfig::from_env_or_panic();
            assert_eq!(loaded, config);
        }
    }
}
