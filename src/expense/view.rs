//! The expenses page and the expense view it refreshes after every change.
//!
//! The expense view shows the totals, charts and the expense table for one
//! owner. It is always rendered from a fresh listing so the table, totals and
//! charts can never disagree.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    Error,
    alert::Alert,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, HeadElement,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_amount, format_count, loading_spinner,
    },
    navigation::NavBar,
    session::{OwnerId, Session},
};

use super::{
    ExpenseRecord, ExpenseState, ExpenseStore, Summary,
    charts::{charts_script, charts_view, expense_charts},
    display_label, sort_for_display, summarize,
};

pub(super) const EXPENSE_VIEW_ID: &str = "expense-view";
pub(super) const EXPENSE_FORM_ID: &str = "expense-form";
pub(super) const EXPENSE_DIALOG_ID: &str = "expense-dialog";

/// Triggered when an expense form has been loaded into the dialog.
pub(super) const FORM_LOADED_EVENT: &str = "expense-form-loaded";
/// Triggered when an expense has been saved and the dialog should close.
pub(super) const EXPENSE_SAVED_EVENT: &str = "expense-saved";

/// The owner's expenses in display order together with their totals.
pub(super) struct ExpenseSnapshot {
    pub records: Vec<ExpenseRecord>,
    pub summary: Summary,
}

/// List `owner`'s expenses, put them in display order and add them up.
pub(super) fn load_snapshot(
    store: &dyn ExpenseStore,
    owner: &OwnerId,
) -> Result<ExpenseSnapshot, Error> {
    let mut records = store.list_by_owner(owner)?;
    sort_for_display(&mut records);
    let summary = summarize(&records);

    if !summary.skipped.is_empty() {
        tracing::warn!(
            "{} of {} expenses for owner {owner} have an invalid amount",
            summary.skipped.len(),
            records.len()
        );
    }

    Ok(ExpenseSnapshot { records, summary })
}

/// Display the expenses page for the signed in user.
pub async fn get_expenses_page(
    State(state): State<ExpenseState>,
    Extension(session): Extension<Session>,
) -> Response {
    let snapshot = match load_snapshot(state.expense_store.as_ref(), &session.owner_id) {
        Ok(snapshot) => snapshot,
        Err(error) => return error.into_response(),
    };

    expenses_page(&session, &snapshot, &state.view_config.currency_label).into_response()
}

/// Get a fresh expense view, e.g. after the expenses were changed elsewhere.
pub async fn get_expense_view(
    State(state): State<ExpenseState>,
    Extension(session): Extension<Session>,
) -> Response {
    match load_snapshot(state.expense_store.as_ref(), &session.owner_id) {
        Ok(snapshot) => expense_view(&snapshot, &state.view_config.currency_label).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// The refreshed expense view followed by a success alert, for responding to
/// a change made by `owner`.
pub(super) fn changed_view_response(state: &ExpenseState, owner: &OwnerId, message: &str) -> Response {
    let snapshot = match load_snapshot(state.expense_store.as_ref(), owner) {
        Ok(snapshot) => snapshot,
        Err(error) => return error.into_alert_response(),
    };

    let alert = Alert::SuccessSimple {
        message: message.to_owned(),
    };

    html! {
        (expense_view(&snapshot, &state.view_config.currency_label))
        (alert.into_oob_html())
    }
    .into_response()
}

fn expenses_page(session: &Session, snapshot: &ExpenseSnapshot, currency_label: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW, session.display_name()).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl flex flex-wrap justify-between items-center gap-4 mb-4"
            {
                h1 class="text-2xl font-bold" { "Expenses" }

                div class="flex items-center gap-2"
                {
                    span id="indicator" class="htmx-indicator" { (loading_spinner()) }

                    button
                        type="button"
                        class=(BUTTON_SECONDARY_STYLE)
                        hx-get=(endpoints::EXPENSE_VIEW_API)
                        hx-target={ "#" (EXPENSE_VIEW_ID) }
                        hx-swap="outerHTML"
                        hx-target-error="#alert-container"
                        hx-disabled-elt="this"
                        hx-indicator="#indicator"
                    {
                        "Refresh"
                    }

                    button
                        id="add-expense"
                        type="button"
                        class=(BUTTON_PRIMARY_STYLE)
                        hx-get=(endpoints::NEW_EXPENSE_FORM)
                        hx-target={ "#" (EXPENSE_FORM_ID) }
                        hx-swap="outerHTML"
                        hx-target-error="#alert-container"
                        hx-disabled-elt="this"
                        hx-indicator="#indicator"
                    {
                        "Add Expense"
                    }
                }
            }

            (expense_view(snapshot, currency_label))

            dialog
                id=(EXPENSE_DIALOG_ID)
                class="w-full max-w-md p-6 rounded-lg shadow bg-white dark:bg-gray-800
                    text-gray-900 dark:text-white backdrop:bg-gray-900/50"
            {
                div id=(EXPENSE_FORM_ID) {}
            }
        }
    };

    base(
        "Expenses",
        &[
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            HeadElement::ScriptSource(PreEscaped(dialog_script())),
        ],
        &content,
    )
}

/// Opens the dialog when a form arrives and closes it once the expense is saved.
fn dialog_script() -> String {
    format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const dialog = document.getElementById('{EXPENSE_DIALOG_ID}');

            document.body.addEventListener('{FORM_LOADED_EVENT}', () => {{
                if (!dialog.open) {{
                    dialog.showModal();
                }}
            }});

            document.body.addEventListener('{EXPENSE_SAVED_EVENT}', () => dialog.close());
        }});"#
    )
}

/// The totals, charts and expense table.
///
/// This is the element that is swapped out after every change.
pub(super) fn expense_view(snapshot: &ExpenseSnapshot, currency_label: &str) -> Markup {
    let summary = &snapshot.summary;
    let charts = expense_charts(summary, currency_label);
    let has_totals = !summary.by_category.is_empty();

    html! {
        section id=(EXPENSE_VIEW_ID) class="w-full max-w-screen-xl"
        {
            @if !summary.skipped.is_empty() {
                (skipped_warning(summary.skipped.len()))
            }

            div class="mb-4"
            {
                p class="text-lg"
                {
                    "Total spent: "
                    span id="total-amount" class="font-bold" {
                        (format_amount(summary.total, currency_label))
                    }
                }
            }

            @if has_totals {
                (charts_view(&charts))

                div class="grid grid-cols-1 xl:grid-cols-2 gap-4 mb-4"
                {
                    (category_table(summary, currency_label))
                    (payment_method_table(summary, currency_label))
                }
            }

            @if snapshot.records.is_empty() {
                p id="no-expenses" class="my-8 text-center text-gray-500 dark:text-gray-400"
                {
                    "No expenses recorded yet."
                }
            } @else {
                (expense_table(&snapshot.records, currency_label))
            }

            @if has_totals {
                (charts_script(&charts))
            }
        }
    }
}

fn skipped_warning(skipped_count: usize) -> Markup {
    let noun = if skipped_count == 1 { "expense has" } else { "expenses have" };

    html! {
        div
            id="skipped-warning"
            role="alert"
            class="p-4 mb-4 text-sm text-yellow-800 rounded-lg bg-yellow-50
                dark:bg-gray-800 dark:text-yellow-300"
        {
            (format_count(skipped_count)) " " (noun) " an invalid amount and "
            "are left out of the totals and charts. Edit or delete them to fix this."
        }
    }
}

fn category_table(summary: &Summary, currency_label: &str) -> Markup {
    html! {
        table id="category-totals" class="w-full text-sm text-left rtl:text-right"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Share" }
                }
            }

            tbody
            {
                @for (category, total) in summary.categories_by_total() {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (display_label(category)) }
                        td class=(TABLE_CELL_STYLE) { (format_amount(total, currency_label)) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            @if let Some(share) = summary.share_of_total(total) {
                                (format!("{share:.1}%"))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn payment_method_table(summary: &Summary, currency_label: &str) -> Markup {
    html! {
        table id="payment-method-totals" class="w-full text-sm text-left rtl:text-right"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Payment Method" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                }
            }

            tbody
            {
                @for (payment_method, payment_summary) in summary.payment_methods_by_total() {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (display_label(payment_method)) }
                        td class=(TABLE_CELL_STYLE) { (format_count(payment_summary.count)) }
                        td class=(TABLE_CELL_STYLE) {
                            (format_amount(payment_summary.total, currency_label))
                        }
                    }
                }
            }
        }
    }
}

fn expense_table(records: &[ExpenseRecord], currency_label: &str) -> Markup {
    html! {
        div class="overflow-x-auto rounded shadow-md"
        {
            table id="expenses" class="w-full text-sm text-left rtl:text-right"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Payment Method" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for record in records {
                        (expense_row(record, currency_label))
                    }
                }
            }
        }
    }
}

fn expense_row(record: &ExpenseRecord, currency_label: &str) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_EXPENSE_FORM, record.id);
    let delete_url = format_endpoint(endpoints::EXPENSE, record.id);

    html! {
        tr class=(TABLE_ROW_STYLE) data-expense-id=(record.id)
        {
            td class=(TABLE_CELL_STYLE) { (record.date.to_string()) }
            td class=(TABLE_CELL_STYLE) { (record.description) }
            td class=(TABLE_CELL_STYLE) { (display_label(&record.category)) }
            td class=(TABLE_CELL_STYLE) { (display_label(&record.payment_method)) }
            td class={ (TABLE_CELL_STYLE) " text-right" }
            {
                @match record.amount() {
                    Ok(amount) => {
                        (format_amount(amount, currency_label))
                    }
                    Err(_) => {
                        span
                            class="invalid-amount text-red-600 dark:text-red-400"
                            title=(format!("Stored amount: {:?}", record.raw_amount))
                        {
                            "Invalid amount"
                        }
                    }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    button
                        type="button"
                        class=(LINK_STYLE)
                        hx-get=(edit_url)
                        hx-target={ "#" (EXPENSE_FORM_ID) }
                        hx-swap="outerHTML"
                        hx-target-error="#alert-container"
                        hx-disabled-elt="this"
                        hx-indicator="#indicator"
                    {
                        "Edit"
                    }

                    button
                        type="button"
                        class=(BUTTON_DELETE_STYLE)
                        hx-delete=(delete_url)
                        hx-confirm="Are you sure you want to delete this expense?"
                        hx-target={ "#" (EXPENSE_VIEW_ID) }
                        hx-swap="outerHTML"
                        hx-target-error="#alert-container"
                        hx-disabled-elt="this"
                        hx-indicator="#indicator"
                    {
                        "Delete"
                    }
                }
            }
        }
    }
}
