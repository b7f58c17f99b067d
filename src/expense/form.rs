//! The form for recording a new expense or changing an existing one.
//!
//! The same form is used for both: an empty hidden expense ID means a new
//! expense, otherwise the expense with that ID is updated. Input is checked
//! before anything is written, in this order: required fields, amount, date,
//! expense ID. A form that fails the checks is sent back with the entered
//! values and an error message, and nothing is written.

use std::{collections::BTreeSet, str::FromStr};

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::{HX_RESWAP, HX_RETARGET, HX_TRIGGER};
use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error, ValidationError,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        loading_spinner,
    },
    session::{OwnerId, Session},
    timezone::local_today,
};

use super::{
    DEFAULT_PAYMENT_METHODS, ExpenseId, ExpensePayload, ExpenseRecord, ExpenseState,
    ExpenseStore, MAX_AMOUNT,
    view::{
        EXPENSE_DIALOG_ID, EXPENSE_FORM_ID, EXPENSE_SAVED_EVENT, EXPENSE_VIEW_ID,
        FORM_LOADED_EVENT, changed_view_response,
    },
};

/// Dates in the form use the format of `<input type="date">`, e.g. "2025-01-15".
const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The raw values of the expense form, exactly as the user entered them.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExpenseForm {
    /// Empty for a new expense, otherwise the ID of the expense to update.
    #[serde(default)]
    pub expense_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub payment_method: String,
}

/// Whether a form creates a new expense or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FormMode {
    Create,
    Edit(ExpenseId),
}

impl ExpenseForm {
    /// An empty form for a new expense dated `today`.
    fn new(today: Date) -> Self {
        Self {
            date: format_date(today),
            ..Default::default()
        }
    }

    /// A form filled in with `record`.
    ///
    /// The amount is shown as stored so that invalid amounts can be fixed.
    fn from_record(record: &ExpenseRecord) -> Self {
        Self {
            expense_id: record.id.to_string(),
            description: record.description.clone(),
            category: record.category.clone(),
            date: format_date(record.date),
            amount: record.raw_amount.clone(),
            payment_method: record.payment_method.clone(),
        }
    }

    fn mode(&self) -> FormMode {
        match self.expense_id.trim().parse() {
            Ok(id) => FormMode::Edit(id),
            Err(_) => FormMode::Create,
        }
    }

    /// Check the form and turn it into a payload.
    ///
    /// # Errors
    /// Returns the first failed check:
    /// 1. [ValidationError::MissingRequiredField] if category, date or amount is blank,
    /// 2. [ValidationError::InvalidAmount] if the amount is not a positive number
    ///    of at most [MAX_AMOUNT],
    /// 3. [ValidationError::InvalidDate] if the date is not a real date,
    /// 4. [ValidationError::InvalidExpenseId] if the hidden expense ID is not an ID.
    pub(super) fn validate(&self) -> Result<(FormMode, ExpensePayload), ValidationError> {
        let category = self.category.trim();
        let date = self.date.trim();
        let amount = self.amount.trim();

        if category.is_empty() || date.is_empty() || amount.is_empty() {
            return Err(ValidationError::MissingRequiredField);
        }

        let amount = Decimal::from_str(amount).map_err(|_| ValidationError::InvalidAmount)?;

        if amount <= Decimal::ZERO || amount > MAX_AMOUNT {
            return Err(ValidationError::InvalidAmount);
        }

        let date = Date::parse(date, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate)?;

        let mode = match self.expense_id.trim() {
            "" => FormMode::Create,
            id => FormMode::Edit(id.parse().map_err(|_| ValidationError::InvalidExpenseId)?),
        };

        let payload = ExpensePayload {
            description: self.description.trim().to_owned(),
            category: category.to_owned(),
            date,
            amount,
            payment_method: self.payment_method.trim().to_owned(),
        };

        Ok((mode, payload))
    }
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// The values offered in the form's category and payment method lists.
#[derive(Debug, Default, PartialEq)]
struct Suggestions {
    categories: BTreeSet<String>,
    payment_methods: BTreeSet<String>,
}

impl Suggestions {
    /// The default payment methods plus everything `owner` has used before.
    fn load(store: &dyn ExpenseStore, owner: &OwnerId) -> Result<Self, Error> {
        let records = store.list_by_owner(owner)?;

        let categories = records
            .iter()
            .map(|record| record.category.trim())
            .filter(|category| !category.is_empty())
            .map(str::to_owned)
            .collect();

        let payment_methods = DEFAULT_PAYMENT_METHODS
            .iter()
            .copied()
            .chain(records.iter().map(|record| record.payment_method.trim()))
            .filter(|payment_method| !payment_method.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            categories,
            payment_methods,
        })
    }

    fn defaults() -> Self {
        Self {
            categories: BTreeSet::new(),
            payment_methods: DEFAULT_PAYMENT_METHODS
                .iter()
                .map(|payment_method| payment_method.to_string())
                .collect(),
        }
    }
}

/// Get an empty expense form with today's date.
pub async fn get_new_expense_form(
    State(state): State<ExpenseState>,
    Extension(session): Extension<Session>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let suggestions = match Suggestions::load(state.expense_store.as_ref(), &session.owner_id) {
        Ok(suggestions) => suggestions,
        Err(error) => return error.into_alert_response(),
    };

    loaded_form_response(expense_form(&ExpenseForm::new(today), &suggestions, None))
}

/// Get the expense form filled in with the expense `expense_id`.
pub async fn get_edit_expense_form(
    State(state): State<ExpenseState>,
    Extension(session): Extension<Session>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let store = state.expense_store.as_ref();

    let record = match store.get(&session.owner_id, expense_id) {
        Ok(record) => record,
        Err(error) => return error.into_alert_response(),
    };

    let suggestions = match Suggestions::load(store, &session.owner_id) {
        Ok(suggestions) => suggestions,
        Err(error) => return error.into_alert_response(),
    };

    loaded_form_response(expense_form(
        &ExpenseForm::from_record(&record),
        &suggestions,
        None,
    ))
}

fn loaded_form_response(form: Markup) -> Response {
    ([(HX_TRIGGER, FORM_LOADED_EVENT)], form).into_response()
}

/// Save the expense in the form and respond with the refreshed expense view.
///
/// A form that fails validation is sent back in place of the form. Store
/// failures are shown as an alert and leave the form as it is.
pub async fn submit_expense_form(
    State(state): State<ExpenseState>,
    Extension(session): Extension<Session>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let owner = &session.owner_id;
    let store = state.expense_store.as_ref();

    let (mode, payload) = match form.validate() {
        Ok(validated) => validated,
        Err(error) => {
            tracing::debug!("Rejected expense form for owner {owner}: {error}");
            let suggestions = Suggestions::load(store, owner).unwrap_or_else(|error| {
                tracing::warn!(
                    "Could not load form suggestions for owner {owner}, using defaults: {error}"
                );
                Suggestions::defaults()
            });

            return (
                [
                    (HX_RETARGET, format!("#{EXPENSE_FORM_ID}")),
                    (HX_RESWAP, "outerHTML".to_owned()),
                ],
                expense_form(&form, &suggestions, Some(&error.to_string())),
            )
                .into_response();
        }
    };

    let (result, message) = match mode {
        FormMode::Create => (
            store.create(owner, &payload).map(|id| {
                tracing::info!("Created expense {id} for owner {owner}");
            }),
            "Expense added successfully!",
        ),
        FormMode::Edit(id) => (
            store.update(owner, id, &payload).map(|_| {
                tracing::info!("Updated expense {id} for owner {owner}");
            }),
            "Expense updated successfully!",
        ),
    };

    if let Err(error) = result {
        tracing::error!("Could not save expense for owner {owner}: {error}");
        return error.into_alert_response();
    }

    (
        [(HX_TRIGGER, EXPENSE_SAVED_EVENT)],
        changed_view_response(&state, owner, message),
    )
        .into_response()
}

fn expense_form(form: &ExpenseForm, suggestions: &Suggestions, error_message: Option<&str>) -> Markup {
    let (title, submit_text) = match form.mode() {
        FormMode::Create => ("Register Expense", "Add Expense"),
        FormMode::Edit(_) => ("Edit Expense", "Save Changes"),
    };

    html! {
        form
            id=(EXPENSE_FORM_ID)
            hx-post=(endpoints::EXPENSES_API)
            hx-target={ "#" (EXPENSE_VIEW_ID) }
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-disabled-elt="find button[type='submit']"
            hx-indicator="#form-indicator"
            class="space-y-4"
        {
            h2 class="text-xl font-bold" { (title) }

            input type="hidden" name="expense_id" value=(form.expense_id);

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    type="text"
                    name="description"
                    id="description"
                    placeholder="What was it for?"
                    value=(form.description)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                input
                    type="text"
                    name="category"
                    id="category"
                    list="category-options"
                    placeholder="e.g. Food"
                    required
                    value=(form.category)
                    class=(FORM_TEXT_INPUT_STYLE);

                datalist id="category-options"
                {
                    @for category in &suggestions.categories {
                        option value=(category) {}
                    }
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    type="date"
                    name="date"
                    id="date"
                    required
                    value=(form.date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    type="number"
                    name="amount"
                    id="amount"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    value=(form.amount)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="payment_method" class=(FORM_LABEL_STYLE) { "Payment Method" }

                input
                    type="text"
                    name="payment_method"
                    id="payment_method"
                    list="payment-method-options"
                    placeholder="e.g. Cash"
                    value=(form.payment_method)
                    class=(FORM_TEXT_INPUT_STYLE);

                datalist id="payment-method-options"
                {
                    @for payment_method in &suggestions.payment_methods {
                        option value=(payment_method) {}
                    }
                }
            }

            @if let Some(error_message) = error_message {
                p class="text-red-500 text-base" { (error_message) }
            }

            div class="flex justify-end gap-2"
            {
                button
                    type="button"
                    class=(BUTTON_SECONDARY_STYLE)
                    onclick={ "document.getElementById('" (EXPENSE_DIALOG_ID) "').close()" }
                {
                    "Cancel"
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="form-indicator" class="htmx-indicator" { (loading_spinner()) }
                    (submit_text)
                }
            }
        }
    }
}

#[cfg(test)]
mod validation_tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{ValidationError, expense::MAX_AMOUNT};

    use super::{ExpenseForm, FormMode};

    fn form(category: &str, date: &str, amount: &str) -> ExpenseForm {
        ExpenseForm {
            expense_id: String::new(),
            description: "Lunch".to_owned(),
            category: category.to_owned(),
            date: date.to_owned(),
            amount: amount.to_owned(),
            payment_method: "Cash".to_owned(),
        }
    }

    #[test]
    fn valid_form_creates_payload() {
        let (mode, payload) = form("Food", "2025-01-15", "12.50").validate().unwrap();

        assert_eq!(mode, FormMode::Create);
        assert_eq!(payload.category, "Food");
        assert_eq!(payload.date, date!(2025 - 01 - 15));
        assert_eq!(payload.amount, Decimal::from_str("12.50").unwrap());
        assert_eq!(payload.payment_method, "Cash");
        assert_eq!(payload.description, "Lunch");
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let cases = [
            form("", "2025-01-15", "12.50"),
            form("Food", "", "12.50"),
            form("Food", "2025-01-15", ""),
            form("   ", "2025-01-15", "12.50"),
        ];

        for case in cases {
            assert_eq!(
                case.validate(),
                Err(ValidationError::MissingRequiredField),
                "{case:?}"
            );
        }
    }

    #[test]
    fn missing_field_is_reported_before_invalid_amount() {
        assert_eq!(
            form("", "2025-01-15", "abc").validate(),
            Err(ValidationError::MissingRequiredField)
        );
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        for amount in ["0", "-5", "0.00", "abc", "1,50"] {
            assert_eq!(
                form("Food", "2025-01-15", amount).validate(),
                Err(ValidationError::InvalidAmount),
                "amount {amount:?}"
            );
        }
    }

    #[test]
    fn smallest_amount_is_accepted() {
        let (_, payload) = form("Food", "2025-01-15", "0.01").validate().unwrap();

        assert_eq!(payload.amount, Decimal::from_str("0.01").unwrap());
    }

    #[test]
    fn largest_amount_is_accepted() {
        let (_, payload) = form("Rent", "2025-01-15", "1000000000000").validate().unwrap();

        assert_eq!(payload.amount, MAX_AMOUNT);
    }

    #[test]
    fn amounts_above_maximum_are_rejected() {
        for amount in [
            "1000000000000.01",
            "1000000000000000000000000000",
            "50000000000000000000000000000",
        ] {
            assert_eq!(
                form("Food", "2025-01-15", amount).validate(),
                Err(ValidationError::InvalidAmount),
                "amount {amount:?}"
            );
        }
    }

    #[test]
    fn invalid_amount_is_reported_before_invalid_date() {
        assert_eq!(
            form("Food", "yesterday", "-1").validate(),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn invalid_dates_are_rejected() {
        for date in ["yesterday", "2025-02-30", "15/01/2025"] {
            assert_eq!(
                form("Food", date, "1").validate(),
                Err(ValidationError::InvalidDate),
                "date {date:?}"
            );
        }
    }

    #[test]
    fn expense_id_selects_edit_mode() {
        let mut edit = form("Food", "2025-01-15", "1");
        edit.expense_id = "7".to_owned();

        let (mode, _) = edit.validate().unwrap();

        assert_eq!(mode, FormMode::Edit(7));
    }

    #[test]
    fn invalid_expense_id_is_rejected() {
        let mut edit = form("Food", "2025-01-15", "1");
        edit.expense_id = "seven".to_owned();

        assert_eq!(edit.validate(), Err(ValidationError::InvalidExpenseId));
    }
}
