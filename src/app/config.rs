use axum_extra::extract::cookie::Key;
use url::Url;

use super::error::AppError;
use crate::oauth::OAuthConfig;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5000;

/// Settings shared by the route handlers.
#[derive(Clone)]
pub struct AppSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) secure_cookies: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "xero_connect.sid".into(),
            secure_cookies: false,
        }
    }
}

impl AppSettings {
    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}

/// Process configuration, built once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub oauth: OAuthConfig,
    pub settings: AppSettings,
    pub port: u16,
}

impl AppConfig {
    /// Create configuration from environment variables.
    ///
    /// # Required env vars
    /// - `CLIENT_ID`: OAuth2 client ID
    /// - `CLIENT_SECRET`: OAuth2 client secret
    /// - `REDIRECT_URI`: OAuth2 callback URI (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `PORT`: Listening port (default 5000)
    /// - `XERO_ISSUER_URL`: Override the OpenID issuer used for discovery
    /// - `XERO_API_URL`: Override the accounting API base URL
    /// - `SECURE_COOKIES`: Set to `"1"` or `"true"` to mark cookies `Secure`
    /// - `COOKIE_KEY`: Cookie encryption key bytes
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if required env vars are missing or values are invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if required values are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{name} is required")))
        };

        let client_id = required("CLIENT_ID")?;
        let client_secret = required("CLIENT_SECRET")?;
        let redirect_uri: Url = required("REDIRECT_URI")?
            .parse()
            .map_err(|e| AppError::Config(format!("REDIRECT_URI: {e}")))?;

        let mut oauth = OAuthConfig::new(client_id, client_secret, redirect_uri);

        if let Some(url_str) = lookup("XERO_ISSUER_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| AppError::Config(format!("XERO_ISSUER_URL: {e}")))?;
            oauth = oauth.with_issuer_url(url);
        }
        if let Some(url_str) = lookup("XERO_API_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| AppError::Config(format!("XERO_API_URL: {e}")))?;
            oauth = oauth.with_api_url(url);
        }

        let port = match lookup("PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("PORT: {e}")))?,
            None => DEFAULT_PORT,
        };

        let secure_cookies = matches!(lookup("SECURE_COOKIES").as_deref(), Some("1" | "true"));

        let cookie_key = match lookup("COOKIE_KEY") {
            Some(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                AppError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            None => Key::generate(),
        };

        Ok(Self {
            oauth,
            settings: AppSettings::default()
                .with_cookie_key(cookie_key)
                .with_secure_cookies(secure_cookies),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("CLIENT_ID", "client-1"),
        ("CLIENT_SECRET", "secret-1"),
        ("REDIRECT_URI", "http://localhost:5000/callback"),
    ];

    #[test]
    fn required_vars_only() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.oauth.client_id(), "client-1");
        assert_eq!(
            config.oauth.redirect_uri().as_str(),
            "http://localhost:5000/callback"
        );
        assert!(!config.settings.secure_cookies());
        assert_eq!(config.oauth.api_url().as_str(), "https://api.xero.com/");
    }

    #[test]
    fn each_required_var_is_fatal_when_missing() {
        for missing in ["CLIENT_ID", "CLIENT_SECRET", "REDIRECT_URI"] {
            let pairs: Vec<_> = REQUIRED.into_iter().filter(|(k, _)| *k != missing).collect();
            match AppConfig::from_lookup(lookup_from(&pairs)) {
                Err(AppError::Config(msg)) => assert!(msg.contains(missing), "{msg}"),
                Err(other) => panic!("unexpected error: {other}"),
                Ok(_) => panic!("{missing} should be required"),
            }
        }
    }

    #[test]
    fn empty_required_var_is_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("CLIENT_ID", "  ");
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&pairs)),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn invalid_redirect_uri() {
        let mut pairs = REQUIRED.to_vec();
        pairs[2] = ("REDIRECT_URI", "not a url");
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&pairs)),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn optional_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "8080"),
            ("SECURE_COOKIES", "true"),
            ("XERO_API_URL", "http://127.0.0.1:9999"),
            ("XERO_ISSUER_URL", "http://127.0.0.1:9998"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.settings.secure_cookies());
        assert_eq!(config.oauth.api_url().as_str(), "http://127.0.0.1:9999/");
        assert_eq!(config.oauth.issuer_url().as_str(), "http://127.0.0.1:9998/");
    }

    #[test]
    fn invalid_port_and_short_cookie_key() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "not-a-port"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("COOKIE_KEY", "too-short"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());
    }
}
