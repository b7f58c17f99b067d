//! Stores the session in a private (encrypted and signed) cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::Error;

use super::{Session, token::Token};

pub(crate) const COOKIE_TOKEN: &str = "session";
/// The default duration for which session cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// Add a session cookie for `session` to the cookie jar.
///
/// The session expires `duration` from now.
///
/// # Errors
///
/// Returns [Error::JSONSerializationError] if the token cannot be serialized.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    session: Session,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;

    set_token_cookie(
        jar,
        Token {
            session,
            expires_at,
        },
    )
}

fn set_token_cookie(jar: PrivateCookieJar, token: Token) -> Result<PrivateCookieJar, Error> {
    let expires_at = token.expires_at;
    let token_string = serde_json::to_string(&token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_string))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true)
            .path("/"),
    ))
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true)
            .path("/"),
    )
}

fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::SessionMissing)?;

    serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::SessionMissing)
}

/// Get the session stored in `jar`.
///
/// # Errors
///
/// Returns [Error::SessionMissing] if there is no session cookie, the cookie
/// cannot be read or the session has expired.
pub(crate) fn get_session_from_cookies(jar: &PrivateCookieJar) -> Result<Session, Error> {
    let token = get_token_from_cookies(jar)?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::SessionMissing);
    }

    Ok(token.session)
}

/// Set the expiry of the session cookie in `jar` to the latest of UTC now
/// plus `duration` and the cookie's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns [Error::SessionMissing] if the session cookie is not in the jar.
pub(crate) fn extend_session_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;
    let expires_at = max(token.expires_at, OffsetDateTime::now_utc() + duration);

    set_token_cookie(
        jar,
        Token {
            session: token.session,
            expires_at,
        },
    )
}
