use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use time::Duration;

use crate::types::Credential;

/// Removal cookie for the credential. Always emitted, whether or not the
/// request carried the cookie.
pub(super) fn clear_credential_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Credential from the request cookies. Presence only; empty values count as absent.
pub(super) fn get_credential(jar: &CookieJar, name: &str) -> Option<Credential> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .map(Credential::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = clear_credential_cookie("jwt");
        assert_eq!(cookie.name(), "jwt");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn empty_cookie_is_absent() {
        let jar = CookieJar::new().add(Cookie::new("jwt", ""));
        assert!(get_credential(&jar, "jwt").is_none());

        let jar = CookieJar::new().add(Cookie::new("jwt", "tok"));
        assert_eq!(get_credential(&jar, "jwt"), Some(Credential::new("tok")));
        assert!(get_credential(&jar, "other").is_none());
    }
}
