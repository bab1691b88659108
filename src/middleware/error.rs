use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use super::config::GuardSettings;
use super::cookies;

/// Errors for the route surface.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// No credential, or the downstream service refused it.
    #[error("Not authenticated")]
    Unauthenticated {
        login_path: String,
        /// Cookie to clear on the way out, when the credential turned out stale.
        stale_cookie: Option<String>,
    },

    /// The service answered with an application-level rejection.
    #[error("{0}")]
    Rejected(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The service could not be reached or answered garbage.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl PortalError {
    /// Missing credential at the guard.
    pub(super) fn unauthenticated(settings: &GuardSettings) -> Self {
        Self::Unauthenticated {
            login_path: settings.login_path.clone(),
            stale_cookie: None,
        }
    }

    /// Map a client error from a protected data fetch.
    ///
    /// A refused credential is handled exactly like a missing one.
    pub(super) fn from_client(err: crate::error::Error, settings: &GuardSettings) -> Self {
        use crate::error::Error;
        match err {
            Error::Unauthorized { .. } => Self::Unauthenticated {
                login_path: settings.login_path.clone(),
                stale_cookie: Some(settings.credential_cookie.clone()),
            },
            Error::Rejected { message, .. } => Self::Rejected(message),
            Error::Validation(message) => Self::BadRequest(message),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated {
                login_path,
                stale_cookie,
            } => {
                let redirect = Redirect::to(&login_path);
                match stale_cookie {
                    Some(name) => {
                        let jar = CookieJar::new().add(cookies::clear_credential_cookie(&name));
                        (jar, redirect).into_response()
                    }
                    None => redirect.into_response(),
                }
            }
            Self::Rejected(message) => (StatusCode::UNPROCESSABLE_ENTITY, message).into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Upstream(ref detail) => {
                tracing::error!(detail = %detail, "Upstream service failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "Internal server error. Please try again later",
                )
                    .into_response()
            }
        }
    }
}
