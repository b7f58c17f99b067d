//! Totals of expenses per category and per payment method.
//!
//! Expenses with an invalid amount are left out of every figure and
//! reported in [Summary::skipped] so the caller can warn the user.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::{ExpenseId, ExpenseRecord};

/// How much was paid with a payment method, and how many times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentMethodSummary {
    /// The sum of the amounts paid with the method.
    pub total: Decimal,
    /// The number of expenses paid with the method.
    pub count: usize,
}

/// The totals for a list of expenses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    /// The sum of all valid amounts.
    pub total: Decimal,
    /// The sum of amounts per category.
    pub by_category: HashMap<String, Decimal>,
    /// The sum and count of expenses per payment method.
    pub by_payment_method: HashMap<String, PaymentMethodSummary>,
    /// The expenses left out because their amount is invalid, in input order.
    pub skipped: Vec<ExpenseId>,
}

/// Compute the totals for `records`.
///
/// The category and payment method totals each add up to [Summary::total].
/// Records whose amount is invalid (see [ExpenseRecord::amount]) or would
/// overflow the totals are logged and listed in [Summary::skipped] instead.
pub fn summarize(records: &[ExpenseRecord]) -> Summary {
    let mut summary = Summary::default();

    for record in records {
        let amount = match record.amount() {
            Ok(amount) => amount,
            Err(error) => {
                tracing::warn!("Leaving expense out of the totals: {error}");
                summary.skipped.push(record.id);
                continue;
            }
        };

        let total = summary.total.checked_add(amount);
        let category_total = summary
            .by_category
            .get(&record.category)
            .copied()
            .unwrap_or_default()
            .checked_add(amount);
        let payment_method_total = summary
            .by_payment_method
            .get(&record.payment_method)
            .map(|payment_method| payment_method.total)
            .unwrap_or_default()
            .checked_add(amount);

        let (Some(total), Some(category_total), Some(payment_method_total)) =
            (total, category_total, payment_method_total)
        else {
            tracing::warn!(
                "Leaving expense {} out of the totals: adding {amount} overflows the totals",
                record.id
            );
            summary.skipped.push(record.id);
            continue;
        };

        summary.total = total;
        summary
            .by_category
            .insert(record.category.clone(), category_total);

        let payment_method = summary
            .by_payment_method
            .entry(record.payment_method.clone())
            .or_default();
        payment_method.total = payment_method_total;
        payment_method.count += 1;
    }

    summary
}

impl Summary {
    /// Categories with their totals, largest first. Ties are broken by name.
    pub fn categories_by_total(&self) -> Vec<(&str, Decimal)> {
        let mut categories: Vec<_> = self
            .by_category
            .iter()
            .map(|(category, total)| (category.as_str(), *total))
            .collect();

        categories.sort_by(|(a_name, a_total), (b_name, b_total)| {
            b_total.cmp(a_total).then_with(|| a_name.cmp(b_name))
        });

        categories
    }

    /// Payment methods with their totals, largest first. Ties are broken by name.
    pub fn payment_methods_by_total(&self) -> Vec<(&str, PaymentMethodSummary)> {
        let mut payment_methods: Vec<_> = self
            .by_payment_method
            .iter()
            .map(|(payment_method, summary)| (payment_method.as_str(), *summary))
            .collect();

        payment_methods.sort_by(|(a_name, a), (b_name, b)| {
            b.total.cmp(&a.total).then_with(|| a_name.cmp(b_name))
        });

        payment_methods
    }

    /// The percentage of the total that `amount` makes up, rounded to one
    /// decimal place.
    ///
    /// Returns `None` when the total is zero or the share cannot be computed
    /// without overflowing.
    pub fn share_of_total(&self, amount: Decimal) -> Option<Decimal> {
        if self.total.is_zero() {
            return None;
        }

        let share = amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .checked_div(self.total)?;

        Some(share.round_dp(1))
    }
}
