//! Session cookie construction -- HttpOnly sid cookie, set at login/register,
//! cleared at logout.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use super::auth::SESSION_COOKIE;

/// Build the HttpOnly session cookie carrying the sid.
pub fn session_cookie(sid: &str, ttl_seconds: u64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, sid.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(ttl_seconds as i64))
        .build()
}

/// Build an expired cookie that clears the session from the browser.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
