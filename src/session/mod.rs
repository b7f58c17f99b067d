//! Sessions for users signed in through the upstream identity provider.
//!
//! The identity provider in front of the server authenticates users and
//! forwards their identity in request headers. The [session_guard] turns
//! that identity into a session stored in a private cookie, and hands the
//! [Session] to route handlers as a request extension.

mod cookie;
mod log_out;
mod middleware;
mod token;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use log_out::get_log_out;
pub use middleware::{SessionState, session_guard};

#[cfg(test)]
pub(crate) use cookie::{COOKIE_TOKEN, set_session_cookie};

/// The stable ID of the user that owns a set of expenses, as issued by the
/// identity provider.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Create an owner ID from the identity provider's user ID.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    /// Returns [Error::EmptyOwnerId] if `id` is empty or only whitespace.
    pub fn new(id: &str) -> Result<Self, Error> {
        let id = id.trim();

        if id.is_empty() {
            return Err(Error::EmptyOwnerId);
        }

        Ok(Self(id.to_owned()))
    }

    /// The owner ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OwnerId::new(&value)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The signed in user for the current request.
///
/// Route handlers behind the [session_guard] can receive it with
/// `Extension(session): Extension<Session>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The owner of the expenses the user may see and change.
    pub owner_id: OwnerId,

    /// The user's email address, if the identity provider shares it.
    pub email: Option<String>,
}

impl Session {
    /// The name to show the user in the navigation bar.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(self.owner_id.as_str())
    }
}
