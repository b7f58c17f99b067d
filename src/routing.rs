//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, endpoints,
    expense::{
        delete_expense_endpoint, get_edit_expense_form, get_expense_view, get_expenses_page,
        get_new_expense_form, submit_expense_form,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    session::{get_log_out, session_guard},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::EXPENSE_VIEW_API, get(get_expense_view))
        .route(endpoints::NEW_EXPENSE_FORM, get(get_new_expense_form))
        .route(endpoints::EDIT_EXPENSE_FORM, get(get_edit_expense_form))
        .route(endpoints::EXPENSES_API, post(submit_expense_form))
        .route(endpoints::EXPENSE, delete(delete_expense_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), session_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the expenses page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::EXPENSES_VIEW)
}
