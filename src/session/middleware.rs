//! Session middleware that starts sessions from identity headers, extends
//! them, and turns away requests without a signed in user.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::{HX_REQUEST, HxRedirect};
use time::Duration;

use crate::{AppState, config::IdentityConfig};

use super::{
    OwnerId, Session,
    cookie::{extend_session_cookie_duration_if_needed, get_session_from_cookies, set_session_cookie},
};

/// The state needed for the session middleware
#[derive(Clone)]
pub struct SessionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    /// Where the identity provider puts the signed in user.
    pub identity: IdentityConfig,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            identity: state.identity.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SessionState> for Key {
    fn from_ref(state: &SessionState) -> Self {
        state.cookie_key.clone()
    }
}

/// Read the signed in user from the identity provider's headers.
///
/// Returns `None` if the user header is missing or blank.
fn session_from_identity_headers(headers: &HeaderMap, identity: &IdentityConfig) -> Option<Session> {
    let owner_id = headers
        .get(identity.user_header.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(|value| OwnerId::new(value).ok())?;

    let email = headers
        .get(identity.email_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_owned);

    Some(Session { owner_id, email })
}

/// Build the sign-in URL that brings the user back to `target` afterwards.
fn build_sign_in_url(sign_in_url: &str, target: &str) -> String {
    let separator = if sign_in_url.contains('?') { '&' } else { '?' };

    match serde_urlencoded::to_string([("rd", target)]) {
        Ok(query) => format!("{sign_in_url}{separator}{query}"),
        Err(_) => sign_in_url.to_owned(),
    }
}

fn not_signed_in_response(headers: &HeaderMap, path: &str, sign_in_url: &str) -> Response {
    if headers.contains_key(HX_REQUEST) {
        // htmx does not follow redirects for swaps, so ask it to navigate instead.
        let target = headers
            .get("HX-Current-URL")
            .and_then(|value| value.to_str().ok())
            .unwrap_or(path);

        (
            HxRedirect(build_sign_in_url(sign_in_url, target)),
            StatusCode::OK,
        )
            .into_response()
    } else {
        Redirect::to(&build_sign_in_url(sign_in_url, path)).into_response()
    }
}

/// Middleware function that makes sure every request has a signed in user.
///
/// The identity headers set by the identity provider take precedence: a
/// request carrying them starts a new session unless the session cookie
/// already belongs to the same user. Otherwise the session cookie is used.
/// Requests with neither are redirected to the sign-in URL, with a HTMX
/// redirect for HTMX requests.
///
/// The session cookie's expiry is extended after every request.
///
/// **Note**: Route handlers can use the function argument `Extension(session): Extension<Session>` to receive the session.
pub async fn session_guard(
    State(state): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to sign in page.");
            return not_signed_in_response(
                &parts.headers,
                parts.uri.path(),
                &state.identity.sign_in_url,
            );
        }
    };

    let header_session = session_from_identity_headers(&parts.headers, &state.identity);
    let cookie_session = get_session_from_cookies(&jar).ok();

    let (session, jar) = match (header_session, cookie_session) {
        (Some(header_session), Some(cookie_session)) if header_session == cookie_session => {
            (cookie_session, jar)
        }
        (Some(header_session), _) => {
            tracing::info!("Starting session for owner {}", header_session.owner_id);

            match set_session_cookie(jar, header_session.clone(), state.cookie_duration) {
                Ok(jar) => (header_session, jar),
                Err(error) => return error.into_response(),
            }
        }
        (None, Some(cookie_session)) => (cookie_session, jar),
        (None, None) => {
            tracing::warn!(
                "Request to {} has no session or identity headers. Redirecting to sign in page.",
                parts.uri.path()
            );
            return not_signed_in_response(
                &parts.headers,
                parts.uri.path(),
                &state.identity.sign_in_url,
            );
        }
    };

    parts.extensions.insert(session);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_session_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

#[cfg(test)]
mod session_guard_tests {
    use axum::{Extension, Router, middleware, routing::get};
    use axum_extra::extract::cookie::{Cookie, Key, SameSite};
    use axum_test::TestServer;
    use sha2::Digest;
    use time::{Duration, OffsetDateTime};

    use crate::{
        config::IdentityConfig,
        session::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, Session},
    };

    use super::{SessionState, build_sign_in_url, session_guard};

    async fn test_handler(Extension(session): Extension<Session>) -> String {
        session.owner_id.to_string()
    }

    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";

    fn get_test_server(cookie_duration: Duration) -> TestServer {
        let hash = sha2::Sha512::digest("nafstenoas");
        let state = SessionState {
            cookie_key: Key::from(&hash),
            cookie_duration,
            identity: IdentityConfig::default(),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route(TEST_API_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), session_guard))
            .with_state(state);

        TestServer::new(app)
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {:?}, want {:?}",
            left,
            right
        );
    }

    #[tokio::test]
    async fn identity_header_starts_session() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("X-Forwarded-User", "user-1")
            .await;

        response.assert_status_ok();
        response.assert_text("user-1");
        let token_cookie = response.cookie(COOKIE_TOKEN);
        assert_eq!(token_cookie.secure(), Some(true));
        assert_eq!(token_cookie.http_only(), Some(true));
        assert_eq!(token_cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn session_cookie_is_enough_without_identity_header() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("X-Forwarded-User", "user-1")
            .await;
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("user-1");
    }

    #[tokio::test]
    async fn identity_header_replaces_session_of_other_user() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("X-Forwarded-User", "user-1")
            .await;
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .add_header("X-Forwarded-User", "user-2")
            .await;

        response.assert_status_ok();
        response.assert_text("user-2");
    }

    #[tokio::test]
    async fn session_guard_extends_cookie_duration() {
        let server = get_test_server(Duration::seconds(5));
        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("X-Forwarded-User", "user-1")
            .await;
        let token_cookie = response.cookie(COOKIE_TOKEN);

        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        let token_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close(
            token_cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::seconds(5),
        );
    }

    #[tokio::test]
    async fn request_without_session_redirects_to_sign_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            build_sign_in_url("/oauth2/sign_in", TEST_PROTECTED_ROUTE)
        );
    }

    #[tokio::test]
    async fn invalid_cookie_redirects_to_sign_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        response.assert_status_see_other();
    }

    #[tokio::test]
    async fn blank_identity_header_redirects_to_sign_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("X-Forwarded-User", "   ")
            .await;

        response.assert_status_see_other();
    }

    #[tokio::test]
    async fn htmx_request_without_session_gets_hx_redirect() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let current_url = "/expenses";

        let response = server
            .get(TEST_API_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            build_sign_in_url("/oauth2/sign_in", current_url)
        );
    }

    #[test]
    fn sign_in_url_includes_return_target() {
        assert_eq!(
            build_sign_in_url("/oauth2/sign_in", "/expenses"),
            "/oauth2/sign_in?rd=%2Fexpenses"
        );
        assert_eq!(
            build_sign_in_url("https://auth.example.com/start?app=spendlog", "/expenses"),
            "https://auth.example.com/start?app=spendlog&rd=%2Fexpenses"
        );
    }
}
