//! Spendlog is a web app for keeping track of personal expenses.
//!
//! This library provides a web server that directly serves HTML pages. Users
//! record expenses, review and edit them in a table, and see where their
//! money went in per-category and per-payment-method charts.
//!
//! Authentication is delegated to an identity provider in front of the
//! server, see [session_guard].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod config;
mod db;
mod endpoints;
mod expense;
mod html;
mod internal_server_error;
mod navigation;
mod not_found;
mod routing;
mod session;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{AppConfig, IdentityConfig, ViewConfig};
pub use db::initialize as initialize_db;
pub use expense::{
    ExpenseId, ExpensePayload, ExpenseRecord, ExpenseStore, PaymentMethodSummary,
    SQLiteExpenseStore, Summary, summarize,
};
pub use routing::build_router;
pub use session::{OwnerId, Session, session_guard};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::get_404_not_found_response};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The ways user input can fail the expense form's local checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// One of category, date or amount was left empty.
    #[error("missing required field")]
    MissingRequiredField,

    /// The amount is not a number or is not strictly positive.
    #[error("invalid amount")]
    InvalidAmount,

    /// The date is not a calendar date in the format YYYY-MM-DD.
    #[error("invalid date")]
    InvalidDate,

    /// The hidden expense ID of an edit form is not a valid ID.
    #[error("invalid expense id")]
    InvalidExpenseId,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The expense store could not complete an operation, e.g. the database
    /// is locked or returned an unexpected error.
    ///
    /// The operation is not retried. The string should only be logged, the
    /// client gets a generic message.
    #[error("the expense store is unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored expense violates the expense invariants, e.g. its amount is
    /// not a positive number.
    #[error("expense {id} is invalid: {reason}")]
    InvalidRecord {
        /// The ID of the offending expense.
        id: ExpenseId,
        /// What is wrong with the expense.
        reason: String,
    },

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update an expense that does not exist for the current owner.
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist for the current owner.
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// An empty string was used as an owner ID.
    #[error("owner ID cannot be empty")]
    EmptyOwnerId,

    /// The request has no valid session cookie.
    #[error("no valid session in the request")]
    SessionMissing,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The currency label used to format amounts is empty.
    #[error("currency label cannot be empty")]
    EmptyCurrencyLabel,

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::StoreUnavailable(error.to_string())
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::StoreUnavailable(reason) => {
                tracing::error!("Could not reach the expense store: {reason}");
                InternalServerError {
                    description: "Your expenses could not be loaded.",
                    fix: "The expense store is unavailable. Try again in a moment.",
                }
                .into_response_with_status(StatusCode::SERVICE_UNAVAILABLE)
            }
            Error::InvalidTimezone(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as a transient alert for the alert container.
    pub(crate) fn into_alert_response(self) -> Response {
        let (status, alert) = match self {
            Error::StoreUnavailable(reason) => {
                tracing::error!("Could not reach the expense store: {reason}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Alert::Error {
                        message: "Could not reach your expenses".to_owned(),
                        details: "The expense store is unavailable. \
                            Nothing was changed, please try again."
                            .to_owned(),
                    },
                )
            }
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not find expense".to_owned(),
                    details: "Try refreshing the page to see if the expense has been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingExpense => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update expense".to_owned(),
                    details: "The expense could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingExpense => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete expense".to_owned(),
                    details: "The expense could not be found. \
                        Try refreshing the page to see if the expense has already been deleted."
                        .to_owned(),
                },
            ),
            Error::InvalidTimezone(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details: "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                    },
                )
            }
        };

        (status, alert).into_response()
    }
}
