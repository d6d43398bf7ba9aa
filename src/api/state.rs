//! Auth configuration and the capabilities shared by every handler.

use crate::accounts::{AccountStore, Hasher};
use crate::sessions::SessionStore;
use std::fmt;
use std::sync::Arc;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;
const DEFAULT_LANDING_PATH: &str = "/";
const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    landing_path: String,
    login_path: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            landing_path: DEFAULT_LANDING_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: String) -> Self {
        self.landing_path = path;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: String) -> Self {
        self.login_path = path;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Where registration and login redirect on success.
    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// Where logout redirects.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Everything a handler needs, passed as a request extension.
pub struct AuthState {
    config: AuthConfig,
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: Hasher,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Hasher,
    ) -> Self {
        Self {
            config,
            accounts,
            sessions,
            hasher,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn accounts(&self) -> &dyn AccountStore {
        self.accounts.as_ref()
    }

    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    #[must_use]
    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AuthConfig::new("http://localhost:8080".to_string());
        assert_eq!(config.session_ttl_seconds(), 1_209_600);
        assert_eq!(config.landing_path(), "/");
        assert_eq!(config.login_path(), "/login");
        assert!(!config.cookie_secure());
    }

    #[test]
    fn https_frontend_marks_cookies_secure() {
        let config = AuthConfig::new("https://example.com".to_string())
            .with_session_ttl_seconds(60)
            .with_landing_path("/home".to_string())
            .with_login_path("/signin".to_string());
        assert!(config.cookie_secure());
        assert_eq!(config.session_ttl_seconds(), 60);
        assert_eq!(config.landing_path(), "/home");
        assert_eq!(config.login_path(), "/signin");
        assert_eq!(config.frontend_base_url(), "https://example.com");
    }
}
