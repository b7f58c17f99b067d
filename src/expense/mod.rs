//! Expenses: where they are stored, how they add up, and the page and
//! fragments for recording and reviewing them.
//!
//! This module contains:
//! - The expense records and the gateway that persists them
//! - The totals per category and per payment method
//! - The expense page, the refreshable expense view with its charts
//! - The expense form and the endpoints for saving and deleting expenses

mod aggregation;
mod charts;
mod delete;
mod domain;
mod form;
mod sqlite;
mod store;
mod view;

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{AppState, config::ViewConfig};

pub use aggregation::{PaymentMethodSummary, Summary, summarize};
pub use delete::delete_expense_endpoint;
pub use domain::{
    DEFAULT_PAYMENT_METHODS, ExpenseId, ExpensePayload, ExpenseRecord, MAX_AMOUNT,
    sort_for_display,
};
pub use form::{get_edit_expense_form, get_new_expense_form, submit_expense_form};
pub use sqlite::{SQLiteExpenseStore, create_expense_table};
pub use store::ExpenseStore;
pub use view::{get_expense_view, get_expenses_page};

/// The state needed by the expense pages and endpoints.
#[derive(Clone)]
pub struct ExpenseState {
    /// Where the expenses are persisted.
    pub expense_store: Arc<dyn ExpenseStore>,
    /// How to display amounts.
    pub view_config: ViewConfig,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            expense_store: state.expense_store.clone(),
            view_config: state.view_config.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The label to show for a category or payment method, which may be blank.
pub(crate) fn display_label(name: &str) -> &str {
    if name.trim().is_empty() {
        "Unspecified"
    } else {
        name
    }
}
