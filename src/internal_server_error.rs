//! The page to display for an internal server error.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl InternalServerError<'_> {
    fn into_html(self, status: StatusCode) -> Html<String> {
        Html(
            error_view(
                "Internal Server Error",
                status.as_str(),
                self.description,
                self.fix,
            )
            .into_string(),
        )
    }

    /// Render the error page with a status other than 500, e.g. 503 when a
    /// dependency is down.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, self.into_html(status)).into_response()
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        self.into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}
