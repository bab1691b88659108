use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use super::config::GuardSettings;
use super::cookies;
use super::error::PortalError;

/// Route Guard middleware.
///
/// Requests under the protected prefix without a credential cookie are
/// redirected to the login path and never reach the handler. Everything
/// else is forwarded unchanged.
///
/// The check is presence, not validity. Handlers behind the guard must still
/// treat a refused credential as unauthenticated (see [`PortalError`]).
pub async fn require_credential(
    State(settings): State<GuardSettings>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if !settings.is_protected(request.uri().path()) {
        return next.run(request).await;
    }

    if cookies::get_credential(&jar, &settings.credential_cookie).is_none() {
        tracing::debug!(path = %request.uri().path(), "No credential, redirecting to login");
        return PortalError::unauthenticated(&settings).into_response();
    }

    next.run(request).await
}

/// Wrap `router` in the Route Guard.
pub fn protect<S>(router: Router<S>, settings: GuardSettings) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(settings, require_credential))
}
