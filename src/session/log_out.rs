//! Log-out route handler that clears the session and hands over to the identity provider.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use super::{SessionState, cookie::invalidate_session_cookie};

/// Invalidate the session cookie and redirect the client to the identity
/// provider's sign-out URL so the upstream session ends too.
pub async fn get_log_out(State(state): State<SessionState>, jar: PrivateCookieJar) -> Response {
    let jar = invalidate_session_cookie(jar);
    tracing::debug!("Cleared session cookie, signing out upstream.");

    (jar, Redirect::to(&state.identity.sign_out_url)).into_response()
}
