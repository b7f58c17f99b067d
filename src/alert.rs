//! Transient alert messages shown at the bottom of the page.
//!
//! Alerts are either returned as the body of an error response, which htmx
//! swaps into `#alert-container` via `hx-target-error`, or appended to a
//! successful response as an out-of-band swap.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    SuccessSimple { message: String },
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (message, details, container_style, icon_style) = match self {
            Alert::SuccessSimple { message } => (
                message,
                String::new(),
                "text-green-800 bg-green-50 border-green-300 dark:bg-gray-800 \
                    dark:text-green-400 dark:border-green-800",
                "text-green-500",
            ),
            Alert::Error { message, details } => (
                message,
                details,
                "text-red-800 bg-red-50 border-red-300 dark:bg-gray-800 \
                    dark:text-red-400 dark:border-red-800",
                "text-red-500",
            ),
        };

        html! {
            div
                role="alert"
                class={ "flex items-start p-4 mb-4 border rounded-lg shadow " (container_style) }
            {
                span class={ "shrink-0 me-3 font-bold " (icon_style) } aria-hidden="true" { "!" }

                div class="text-sm"
                {
                    p class="font-medium" { (message) }

                    @if !details.is_empty() {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="ms-auto -mx-1.5 -my-1.5 p-1.5 rounded-lg inline-flex items-center justify-center h-8 w-8"
                    onclick="document.getElementById('alert-container').classList.add('hidden')"
                {
                    "×"
                }
            }
        }
    }

    /// Render the alert so that htmx swaps it into the alert container
    /// alongside the main response content.
    pub fn into_oob_html(self) -> Markup {
        html! {
            div id="alert-container" hx-swap-oob="innerHTML" {
                (self.into_html())
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        (StatusCode::OK, Html(self.into_html().into_string())).into_response()
    }
}
