use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::types::SessionId;

const STATE_COOKIE_NAME: &str = "__xero_connect_state";

/// Create the `state` cookie for an authorization request.
pub(super) fn state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, state.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::minutes(5))
        .build()
}

/// Create removal cookie for the `state` cookie.
pub(super) fn clear_state_cookie() -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, "")).path("/").build()
}

/// Get the pending `state` from cookies.
pub(super) fn get_state(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string())
}

/// Create the session cookie. It has no max-age and lasts for the browser session.
pub(super) fn session_cookie(name: &str, id: &SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Get the session id from cookies. Unparseable values count as absent.
pub(super) fn get_session_id(jar: &PrivateCookieJar, name: &str) -> Option<SessionId> {
    jar.get(name).and_then(|c| c.value().parse().ok())
}
