//! Implements a struct that holds the state of the server.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    config::{AppConfig, IdentityConfig, ViewConfig},
    expense::ExpenseStore,
    session::DEFAULT_COOKIE_DURATION,
};

/// The state of the server.
#[derive(Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// How to display amounts.
    pub view_config: ViewConfig,

    /// Where the identity provider puts the signed in user.
    pub identity: IdentityConfig,

    /// Where the expenses are persisted.
    pub expense_store: Arc<dyn ExpenseStore>,
}

impl AppState {
    /// Create a new [AppState] around an expense store.
    ///
    /// # Errors
    /// Returns an error if `config` is invalid, see [AppConfig::validate].
    pub fn new(
        expense_store: Arc<dyn ExpenseStore>,
        cookie_secret: &str,
        config: AppConfig,
    ) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: config.local_timezone,
            view_config: config.view,
            identity: config.identity,
            expense_store,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
