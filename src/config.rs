use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Default name of the cookie carrying the session credential.
pub const DEFAULT_CREDENTIAL_COOKIE: &str = "jwt";

/// Where the two external services live, plus client-side knobs.
///
/// Required fields are constructor parameters.
///
/// ```rust,ignore
/// use coderunner_portal::PortalConfig;
///
/// let config = PortalConfig::new(
///     "http://localhost:63010/auth".parse()?,
///     "http://localhost:63010/executor".parse()?,
/// )
/// .with_request_timeout(std::time::Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PortalConfig {
    pub(crate) auth_url: Url,
    pub(crate) executor_url: Url,
    pub(crate) credential_cookie: String,
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) storage_dir: Option<PathBuf>,
}

impl PortalConfig {
    #[must_use]
    pub fn new(auth_url: Url, executor_url: Url) -> Self {
        Self {
            auth_url,
            executor_url,
            credential_cookie: DEFAULT_CREDENTIAL_COOKIE.into(),
            request_timeout: None,
            storage_dir: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `AUTH_SERVICE_URL`: base URL of the auth service
    /// - `EXECUTOR_SERVICE_URL`: base URL of the execution service
    ///
    /// # Optional env vars
    /// - `SESSION_COOKIE_NAME`: credential cookie name (default `jwt`)
    /// - `SESSION_STORAGE_DIR`: directory for the persisted session document
    /// - `REQUEST_TIMEOUT_SECS`: per-request timeout; transport default when unset
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if required vars are missing or values are malformed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable source.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let auth_url = required_url(&lookup, "AUTH_SERVICE_URL")?;
        let executor_url = required_url(&lookup, "EXECUTOR_SERVICE_URL")?;
        let mut config = Self::new(auth_url, executor_url);

        if let Some(name) = lookup("SESSION_COOKIE_NAME") {
            config = config.with_credential_cookie(name);
        }
        if let Some(dir) = lookup("SESSION_STORAGE_DIR") {
            config = config.with_storage_dir(dir);
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| Error::Config(format!("REQUEST_TIMEOUT_SECS: {e}")))?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_credential_cookie(mut self, name: impl Into<String>) -> Self {
        self.credential_cookie = name.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn executor_url(&self) -> &Url {
        &self.executor_url
    }

    #[must_use]
    pub fn credential_cookie(&self) -> &str {
        &self.credential_cookie
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    #[must_use]
    pub fn storage_dir(&self) -> Option<&std::path::Path> {
        self.storage_dir.as_deref()
    }

    /// HTTP client honoring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the TLS backend cannot be initialized.
    #[cfg(feature = "client")]
    pub fn http_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(Into::into)
    }
}

fn required_url(lookup: impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Url, Error> {
    let raw = lookup(var).ok_or_else(|| Error::Config(format!("{var} is required")))?;
    raw.parse()
        .map_err(|e| Error::Config(format!("{var}: {e}")))
}

/// Append path segments to a service base URL, keeping the base path.
///
/// `http://host/executor` + `["problemset", "run"]` → `http://host/executor/problemset/run`.
/// Segments are percent-encoded.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PortalConfig {
        PortalConfig::new(
            "http://localhost:63010/auth".parse().unwrap(),
            "http://localhost:63010/executor/".parse().unwrap(),
        )
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.credential_cookie(), "jwt");
        assert!(config.request_timeout().is_none());
        assert!(config.storage_dir().is_none());
    }

    #[test]
    fn overrides_chain() {
        let config = config()
            .with_credential_cookie("session")
            .with_request_timeout(Duration::from_secs(5))
            .with_storage_dir("/tmp/portal");
        assert_eq!(config.credential_cookie(), "session");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(
            config.storage_dir(),
            Some(std::path::Path::new("/tmp/portal"))
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let config = config();
        let url = endpoint(config.auth_url(), &["login", "authenticate"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:63010/auth/login/authenticate");

        let url = endpoint(config.executor_url(), &["problemset", "run"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:63010/executor/problemset/run");
    }

    #[test]
    fn endpoint_encodes_segments() {
        let base: Url = "http://example.com".parse().unwrap();
        let url = endpoint(&base, &["problemset", "a b", "JAVA"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/problemset/a%20b/JAVA");
    }

    #[test]
    fn endpoint_rejects_opaque_base() {
        let base: Url = "mailto:someone@example.com".parse().unwrap();
        assert!(matches!(endpoint(&base, &["x"]), Err(Error::Config(_))));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn from_lookup_reads_required_and_optional_vars() {
        let config = PortalConfig::from_lookup(vars(&[
            ("AUTH_SERVICE_URL", "http://localhost:63010/auth"),
            ("EXECUTOR_SERVICE_URL", "http://localhost:63010/executor"),
            ("SESSION_COOKIE_NAME", "session"),
            ("SESSION_STORAGE_DIR", "/tmp/portal"),
            ("REQUEST_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.auth_url().as_str(), "http://localhost:63010/auth");
        assert_eq!(config.executor_url().as_str(), "http://localhost:63010/executor");
        assert_eq!(config.credential_cookie(), "session");
        assert_eq!(config.storage_dir(), Some(std::path::Path::new("/tmp/portal")));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn from_lookup_defaults_optional_vars() {
        let config = PortalConfig::from_lookup(vars(&[
            ("AUTH_SERVICE_URL", "http://auth.local"),
            ("EXECUTOR_SERVICE_URL", "http://executor.local"),
        ]))
        .unwrap();
        assert_eq!(config.credential_cookie(), "jwt");
        assert!(config.request_timeout().is_none());
        assert!(config.storage_dir().is_none());
    }

    #[test]
    fn from_lookup_rejects_missing_or_malformed_vars() {
        let err = PortalConfig::from_lookup(vars(&[("AUTH_SERVICE_URL", "http://auth.local")]))
            .unwrap_err();
        assert!(err.to_string().contains("EXECUTOR_SERVICE_URL is required"));

        let err = PortalConfig::from_lookup(vars(&[
            ("AUTH_SERVICE_URL", "not a url"),
            ("EXECUTOR_SERVICE_URL", "http://executor.local"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = PortalConfig::from_lookup(vars(&[
            ("AUTH_SERVICE_URL", "http://auth.local"),
            ("EXECUTOR_SERVICE_URL", "http://executor.local"),
            ("REQUEST_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
    }
}
