use std::sync::Arc;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::multipart::Form;
use url::Url;

use crate::config::{PortalConfig, endpoint};
use crate::error::Error;
use crate::oauth::OAuthCallback;
use crate::session::{SessionStorage, SessionStore};
use crate::transport::{read_envelope, read_login_envelope};
use crate::types::Credential;

const AUTH_TYPE_LOCAL: &str = "LOCAL";

/// Where the caller should go after an auth transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Client-side route change.
    Push(String),
    /// Full document load; nothing from the previous page survives.
    FullReload(String),
}

/// Successful login.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LoginOutcome {
    /// Credential captured from the auth service's `Set-Cookie`, if any.
    pub credential: Option<Credential>,
    pub navigation: Navigation,
}

/// Client for the auth service. The only writer of the [`SessionStore`].
pub struct AuthClient<S> {
    auth_url: Url,
    credential_cookie: String,
    login_redirect: String,
    logout_redirect: String,
    http: reqwest::Client,
    session: Arc<SessionStore<S>>,
}

impl<S: SessionStorage> AuthClient<S> {
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &PortalConfig, session: Arc<SessionStore<S>>) -> Result<Self, Error> {
        Ok(Self {
            auth_url: config.auth_url.clone(),
            credential_cookie: config.credential_cookie.clone(),
            login_redirect: "/problemset".into(),
            logout_redirect: "/".into(),
            http: config.http_client()?,
            session,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Where a successful login sends the user (default `/problemset`).
    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.login_redirect = path.into();
        self
    }

    /// Where logout sends the user (default `/`).
    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.logout_redirect = path.into();
        self
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore<S>> {
        &self.session
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty field (nothing is sent),
    /// [`Error::Rejected`] when the service refuses the credentials,
    /// [`Error::Transport`] / [`Error::Status`] when the service is unreachable.
    /// The session store is untouched on every error path.
    pub async fn authenticate_local(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, Error> {
        if username.is_empty() {
            return Err(Error::Validation("Username is required".into()));
        }
        if password.is_empty() {
            return Err(Error::Validation("Password is required".into()));
        }
        self.authenticate("", username, AUTH_TYPE_LOCAL, password, "local login")
            .await
    }

    /// Finish an OAuth login by re-submitting the callback parameters.
    ///
    /// Prefer [`OAuthLogin::run`](crate::oauth::OAuthLogin::run) at the login
    /// entry point so repeated hits do not resubmit.
    ///
    /// # Errors
    ///
    /// Same contract as [`authenticate_local`](Self::authenticate_local).
    pub async fn authenticate_oauth(
        &self,
        callback: &OAuthCallback,
    ) -> Result<LoginOutcome, Error> {
        self.authenticate(&callback.id, "", &callback.auth_type, "", "oauth login")
            .await
    }

    async fn authenticate(
        &self,
        oauth2_id: &str,
        username: &str,
        auth_type: &str,
        password: &str,
        operation: &'static str,
    ) -> Result<LoginOutcome, Error> {
        let form = Form::new()
            .text("oAuth2Id", oauth2_id.to_string())
            .text("username", username.to_string())
            .text("authType", auth_type.to_string())
            .text("password", password.to_string());

        let response = self
            .http
            .post(endpoint(&self.auth_url, &["login", "authenticate"])?)
            .multipart(form)
            .send()
            .await?;

        let credential = self.capture_credential(&response);
        let accepted = read_login_envelope(response, operation)
            .await
            .and_then(|envelope| envelope.into_optional::<serde_json::Value>(operation));
        if let Err(e) = accepted {
            tracing::warn!(operation, auth_type, error = %e, "Login failed");
            return Err(e);
        }

        self.session.login(credential.clone())?;
        tracing::info!(operation, auth_type, "Login successful");

        Ok(LoginOutcome {
            credential,
            navigation: Navigation::Push(self.login_redirect.clone()),
        })
    }

    /// End the session at the auth service, then locally.
    ///
    /// On success the caller must perform a full reload to the returned target.
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`] or a transport error; the session store is then untouched.
    pub async fn logout(&self) -> Result<Navigation, Error> {
        let operation = "logout";
        let mut request = self
            .http
            .post(endpoint(&self.auth_url, &["login", "logout"])?);
        if let Some(credential) = self.session.credential() {
            request = request.header(
                COOKIE,
                format!("{}={}", self.credential_cookie, credential.as_str()),
            );
        }

        let response = request.send().await?;
        let envelope = read_envelope(response, operation).await?;
        if let Err(e) = envelope.into_optional::<serde_json::Value>(operation) {
            tracing::warn!(error = %e, "Logout rejected");
            return Err(e);
        }

        self.session.logout()?;
        tracing::info!("Logout successful");

        Ok(Navigation::FullReload(self.logout_redirect.clone()))
    }

    fn capture_credential(&self, response: &reqwest::Response) -> Option<Credential> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|raw| cookie::Cookie::parse(raw).ok())
            .find(|c| c.name() == self.credential_cookie && !c.value().is_empty())
            .map(|c| Credential::new(c.value()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::http::header;
    use axum::response::IntoResponse;
    use axum::routing::post;

    use super::*;
    use crate::oauth::OAuthLogin;
    use crate::session::{MemoryStorage, SessionStatus};
    use crate::test_support::{multipart_fields, spawn};

    async fn client_for(router: Router) -> AuthClient<MemoryStorage> {
        let base = spawn(router).await;
        let config = PortalConfig::new(base.clone(), base);
        let session = Arc::new(SessionStore::open(MemoryStorage::new()));
        AuthClient::new(&config, session).unwrap()
    }

    fn rejecting_service() -> Router {
        Router::new().route(
            "/login/authenticate",
            post(|| async {
                axum::Json(serde_json::json!({"code": 0, "message": "bad credentials", "data": null}))
            }),
        )
    }

    fn accepting_service() -> Router {
        Router::new()
            .route(
                "/login/authenticate",
                post(|body: String| async move {
                    let fields = multipart_fields(&body);
                    assert_eq!(fields.get("authType").map(String::as_str), Some("LOCAL"));
                    assert_eq!(fields.get("oAuth2Id").map(String::as_str), Some(""));
                    (
                        [(header::SET_COOKIE, "jwt=token-123; Path=/; HttpOnly")],
                        axum::Json(serde_json::json!({"code": 1, "message": "ok", "data": null})),
                    )
                        .into_response()
                }),
            )
            .route(
                "/login/logout",
                post(|headers: axum::http::HeaderMap| async move {
                    let cookie = headers
                        .get(header::COOKIE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    assert_eq!(cookie, "jwt=token-123");
                    axum::Json(serde_json::json!({"code": 1, "message": "bye"}))
                }),
            )
    }

    #[tokio::test]
    async fn rejected_login_keeps_session_logged_out() {
        let client = client_for(rejecting_service()).await;

        let err = client.authenticate_local("alice", "wrong").await.unwrap_err();

        match err {
            Error::Rejected { message, .. } => assert_eq!(message, "bad credentials"),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(client.session().status(), SessionStatus::LoggedOut);
    }

    #[tokio::test]
    async fn empty_fields_never_reach_the_service() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/login/authenticate",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { axum::Json(serde_json::json!({"code": 1})) }
            }),
        );
        let client = client_for(router).await;

        assert!(matches!(
            client.authenticate_local("", "pw").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            client.authenticate_local("alice", "").await,
            Err(Error::Validation(_))
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn local_login_then_logout() {
        let client = client_for(accepting_service()).await;

        let outcome = client.authenticate_local("alice", "secret").await.unwrap();
        assert_eq!(outcome.navigation, Navigation::Push("/problemset".into()));
        assert_eq!(outcome.credential, Some(Credential::new("token-123")));
        assert_eq!(client.session().status(), SessionStatus::LoggedIn);

        let nav = client.logout().await.unwrap();
        assert_eq!(nav, Navigation::FullReload("/".into()));
        assert_eq!(client.session().status(), SessionStatus::LoggedOut);
        assert!(client.session().credential().is_none());
    }

    #[tokio::test]
    async fn rejected_logout_keeps_session() {
        let router = Router::new()
            .route(
                "/login/authenticate",
                post(|| async { axum::Json(serde_json::json!({"code": 1})) }),
            )
            .route(
                "/login/logout",
                post(|| async { axum::Json(serde_json::json!({"code": 0, "message": "not now"})) }),
            );
        let client = client_for(router).await;
        client.authenticate_local("alice", "secret").await.unwrap();

        let err = client.logout().await.unwrap_err();
        assert_eq!(err.to_string(), "not now");
        assert_eq!(client.session().status(), SessionStatus::LoggedIn);
    }

    #[tokio::test]
    async fn unreachable_service_is_retryable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let base: Url = format!("http://{addr}").parse().unwrap();
        let config = PortalConfig::new(base.clone(), base);
        let session = Arc::new(SessionStore::open(MemoryStorage::new()));
        let client = AuthClient::new(&config, session).unwrap();

        let err = client.authenticate_local("alice", "secret").await.unwrap_err();
        assert!(err.is_retryable(), "expected transport failure, got {err:?}");
        assert_eq!(client.session().status(), SessionStatus::LoggedOut);
    }

    #[tokio::test]
    async fn server_error_is_transport_failure() {
        let router = Router::new().route(
            "/login/authenticate",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = client_for(router).await;

        match client.authenticate_local("alice", "secret").await {
            Err(Error::Status { status, .. }) => assert_eq!(status, 502),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oauth_login_runs_once_per_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/login/authenticate",
            post(move |body: String| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let fields = multipart_fields(&body);
                    assert_eq!(fields.get("oAuth2Id").map(String::as_str), Some("98765"));
                    assert_eq!(fields.get("authType").map(String::as_str), Some("GITHUB"));
                    assert_eq!(fields.get("username").map(String::as_str), Some(""));
                    axum::Json(serde_json::json!({"code": 1}))
                }
            }),
        );
        let client = client_for(router).await;
        let task = OAuthLogin::new();
        let callback = OAuthCallback::from_query("id=98765&authType=GITHUB").unwrap();

        let first = task.run(&client, &callback).await;
        assert!(matches!(first, Some(Ok(_))));
        assert!(task.run(&client, &callback).await.is_none());
        assert!(task.run(&client, &callback.clone()).await.is_none());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(client.session().is_logged_in());
    }

    #[tokio::test]
    async fn refused_credentials_with_401_are_a_rejection() {
        let router = Router::new().route(
            "/login/authenticate",
            post(|| async {
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    axum::Json(serde_json::json!({"code": 0, "message": "bad credentials"})),
                )
            }),
        );
        let client = client_for(router).await;

        let err = client.authenticate_local("alice", "wrong").await.unwrap_err();

        assert!(!err.is_unauthorized());
        assert_eq!(err.to_string(), "bad credentials");
        assert_eq!(
            crate::notify::Notice::from_error(&err).description,
            "bad credentials"
        );
        assert_eq!(client.session().status(), SessionStatus::LoggedOut);
    }

    #[tokio::test]
    async fn bare_403_on_login_is_a_rejection() {
        let router = Router::new().route(
            "/login/authenticate",
            post(|| async { axum::http::StatusCode::FORBIDDEN }),
        );
        let client = client_for(router).await;

        match client.authenticate_local("alice", "wrong").await {
            Err(Error::Rejected { message, .. }) => {
                assert_eq!(message, "local login was refused (HTTP 403)");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_oauth_login_keeps_session_logged_out() {
        let client = client_for(rejecting_service()).await;
        let callback = OAuthCallback::from_query("id=98765&authType=GITHUB").unwrap();

        let err = client.authenticate_oauth(&callback).await.unwrap_err();

        assert_eq!(err.to_string(), "bad credentials");
        assert_eq!(client.session().status(), SessionStatus::LoggedOut);
        assert!(client.session().credential().is_none());
    }
}
