//! Expense deletion endpoint.

use axum::{
    Extension,
    extract::{Path, State},
    response::Response,
};

use crate::{Error, session::Session};

use super::{ExpenseId, ExpenseState, view::changed_view_response};

/// Delete an expense and respond with the refreshed expense view and a success alert.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(session): Extension<Session>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let owner = &session.owner_id;

    match state.expense_store.delete(owner, expense_id) {
        Ok(()) => {
            tracing::info!("Deleted expense {expense_id} for owner {owner}");
            changed_view_response(&state, owner, "Expense deleted successfully!")
        }
        Err(Error::DeleteMissingExpense) => Error::DeleteMissingExpense.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting expense {expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
