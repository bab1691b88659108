use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use super::config::GuardSettings;
use super::cookies;
use super::error::PortalError;
use crate::types::Credential;

/// Credential cookie, required.
///
/// Use as an Axum extractor on protected handlers. Redirects to the login
/// path when the cookie is missing. Like the guard, this checks presence
/// only: a stale credential gets through and is refused by the service,
/// which [`PortalError`] turns into the same redirect.
///
/// # Example
///
/// ```rust,ignore
/// async fn problems(RequireCredential(credential): RequireCredential) -> impl IntoResponse {
///     executor.list_problems(&credential).await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireCredential(pub Credential);

impl<S> FromRequestParts<S> for RequireCredential
where
    S: Send + Sync,
    GuardSettings: FromRef<S>,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = GuardSettings::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        cookies::get_credential(&jar, &settings.credential_cookie)
            .map(Self)
            .ok_or_else(|| PortalError::unauthenticated(&settings))
    }
}
