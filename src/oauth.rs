use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use url::Url;

use crate::auth::{AuthClient, LoginOutcome};
use crate::config::endpoint;
use crate::error::Error;
use crate::session::SessionStorage;

/// Third-party identity provider fronted by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OAuthProvider {
    GitHub,
    /// Any other registration id the auth service knows about.
    Other(String),
}

impl OAuthProvider {
    /// Registration id used in `/oauth2/authorization/{id}`.
    #[must_use]
    pub fn registration_id(&self) -> &str {
        match self {
            Self::GitHub => "github",
            Self::Other(id) => id,
        }
    }
}

/// Browser entry point into the provider's OAuth flow.
///
/// The auth service redirects back to the login page with `id` and
/// `authType` query parameters; feed those to [`OAuthCallback::from_query`].
///
/// # Errors
///
/// Returns [`Error::Config`] if `auth_url` cannot carry a path.
pub fn authorization_url(auth_url: &Url, provider: &OAuthProvider) -> Result<Url, Error> {
    endpoint(
        auth_url,
        &["oauth2", "authorization", provider.registration_id()],
    )
}

/// Parameters the auth service appends when it sends the browser back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OAuthCallback {
    /// Provider-side account id (`oAuth2Id` on the wire).
    pub id: String,
    /// Provider type, re-submitted as `authType`.
    pub auth_type: String,
}

impl OAuthCallback {
    /// Extract the callback parameters from a query string (leading `?` allowed).
    ///
    /// Returns `None` unless both `id` and `authType` are present and non-empty.
    #[must_use]
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut id = None;
        let mut auth_type = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "id" => id = Some(value.into_owned()),
                "authType" => auth_type = Some(value.into_owned()),
                _ => {}
            }
        }
        match (id, auth_type) {
            (Some(id), Some(auth_type)) if !id.is_empty() && !auth_type.is_empty() => {
                Some(Self { id, auth_type })
            }
            _ => None,
        }
    }
}

/// One-shot OAuth auto-login.
///
/// Each distinct callback parameter set is submitted at most once, however many
/// times the login entry point is hit with it. Failed attempts count too: a
/// second try needs a fresh round trip through the provider.
///
/// Every claimed parameter set is remembered for the value's lifetime, so
/// keep one instance per login page, not one per process.
#[derive(Debug, Default)]
pub struct OAuthLogin {
    seen: Mutex<HashSet<OAuthCallback>>,
}

impl OAuthLogin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the login for `callback` unless it already ran.
    ///
    /// Returns `None` (and makes no network call) for a repeated parameter set.
    pub async fn run<S: SessionStorage>(
        &self,
        client: &AuthClient<S>,
        callback: &OAuthCallback,
    ) -> Option<Result<LoginOutcome, Error>> {
        if !self.claim(callback) {
            tracing::debug!(auth_type = %callback.auth_type, "OAuth callback already handled");
            return None;
        }
        Some(client.authenticate_oauth(callback).await)
    }

    fn claim(&self, callback: &OAuthCallback) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(callback.clone())
    }
}
