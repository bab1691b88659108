use crate::config::{DEFAULT_CREDENTIAL_COOKIE, PortalConfig};
use crate::error::Error;
use crate::executor::ExecutorClient;

/// Route Guard settings.
#[derive(Debug, Clone)]
pub struct GuardSettings {
    pub(crate) credential_cookie: String,
    pub(crate) protected_prefix: String,
    pub(crate) login_path: String,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            credential_cookie: DEFAULT_CREDENTIAL_COOKIE.into(),
            protected_prefix: "/problemset".into(),
            login_path: "/login".into(),
        }
    }
}

impl GuardSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential_cookie(mut self, name: impl Into<String>) -> Self {
        self.credential_cookie = name.into();
        self
    }

    /// Paths equal to `prefix` or below it are protected.
    #[must_use]
    pub fn with_protected_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        self.protected_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn credential_cookie(&self) -> &str {
        &self.credential_cookie
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Whether `path` falls under the protected prefix (`/problemset/:path*`).
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        match path.strip_prefix(self.protected_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Route surface configuration.
///
/// Required field (`executor`) is a constructor parameter.
pub struct PortalRoutesConfig {
    pub(super) executor: ExecutorClient,
    pub(super) guard: GuardSettings,
    pub(super) logout_redirect: String,
}

impl PortalRoutesConfig {
    #[must_use]
    pub fn new(executor: ExecutorClient) -> Self {
        Self {
            executor,
            guard: GuardSettings::default(),
            logout_redirect: "/".into(),
        }
    }

    /// Build from a [`PortalConfig`], carrying its credential cookie name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn from_portal_config(config: &PortalConfig) -> Result<Self, Error> {
        let guard = GuardSettings::default().with_credential_cookie(config.credential_cookie());
        Ok(Self::new(ExecutorClient::new(config)?).with_guard(guard))
    }

    /// Convenience: [`PortalConfig::from_env`] then [`from_portal_config`](Self::from_portal_config).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for missing or malformed env vars.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_portal_config(&PortalConfig::from_env()?)
    }

    #[must_use]
    pub fn with_guard(mut self, guard: GuardSettings) -> Self {
        self.guard = guard;
        self
    }

    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.logout_redirect = path.into();
        self
    }
}
