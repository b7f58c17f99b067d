//! The expense records kept by the store and the payloads used to write them.

use std::str::FromStr;

use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

use crate::{Error, session::OwnerId};

/// The store-assigned ID of an expense.
pub type ExpenseId = i64;

/// The payment methods suggested in the expense form, in addition to the
/// ones the owner has used before.
pub const DEFAULT_PAYMENT_METHODS: [&str; 4] = ["Cash", "Credit Card", "Debit Card", "Transfer"];

/// The largest amount a single expense may have: one trillion.
///
/// Totals and shares of totals stay far below the range of [Decimal] with
/// amounts up to this bound.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// A single expense as it is persisted.
///
/// The amount is kept exactly as it was stored so that records written by
/// older versions or other tools can still be listed. Use
/// [ExpenseRecord::amount] to get the validated amount.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user that owns the expense.
    pub owner_id: OwnerId,
    /// What the money was spent on. May be empty.
    pub description: String,
    /// The spending category, e.g. "Food".
    pub category: String,
    /// The amount exactly as stored.
    pub raw_amount: String,
    /// When the money was spent.
    pub date: Date,
    /// How the expense was paid, e.g. "Credit Card". May be empty.
    pub payment_method: String,
    /// When the expense was first stored. Kept as is on updates.
    pub created_at: OffsetDateTime,
}

impl ExpenseRecord {
    /// The amount of the expense.
    ///
    /// # Errors
    /// Returns [Error::InvalidRecord] if the stored amount is missing, is not
    /// a number, is not strictly positive or is above [MAX_AMOUNT].
    pub fn amount(&self) -> Result<Decimal, Error> {
        let raw_amount = self.raw_amount.trim();

        if raw_amount.is_empty() {
            return Err(self.invalid("the amount is missing".to_owned()));
        }

        let amount = Decimal::from_str(raw_amount)
            .map_err(|_| self.invalid(format!("the amount {raw_amount:?} is not a number")))?;

        if amount <= Decimal::ZERO {
            return Err(self.invalid(format!("the amount {amount} is not positive")));
        }

        if amount > MAX_AMOUNT {
            return Err(self.invalid(format!(
                "the amount {amount} is larger than the maximum of {MAX_AMOUNT}"
            )));
        }

        Ok(amount)
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidRecord {
            id: self.id,
            reason,
        }
    }
}

/// The user-editable fields of an expense, checked and ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpensePayload {
    pub description: String,
    pub category: String,
    pub date: Date,
    /// Always strictly positive and at most [MAX_AMOUNT].
    pub amount: Decimal,
    pub payment_method: String,
}

/// Order expenses for display: newest date first, then most recently
/// created, then highest ID.
pub fn sort_for_display(records: &mut [ExpenseRecord]) {
    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use time::macros::{date, datetime};

    use crate::{Error, session::OwnerId};

    use super::{ExpenseRecord, MAX_AMOUNT, sort_for_display};

    fn record(id: i64, raw_amount: &str) -> ExpenseRecord {
        ExpenseRecord {
            id,
            owner_id: OwnerId::new("user-1").unwrap(),
            description: String::new(),
            category: "Food".to_owned(),
            raw_amount: raw_amount.to_owned(),
            date: date!(2025 - 01 - 15),
            payment_method: "Cash".to_owned(),
            created_at: datetime!(2025-01-15 12:00 UTC),
        }
    }

    #[test]
    fn amount_parses_decimal() {
        assert_eq!(
            record(1, "12.50").amount(),
            Ok(Decimal::from_str("12.50").unwrap())
        );
    }

    #[test]
    fn smallest_positive_amount_is_valid() {
        assert_eq!(
            record(1, "0.01").amount(),
            Ok(Decimal::from_str("0.01").unwrap())
        );
    }

    #[test]
    fn zero_amount_is_invalid() {
        assert!(matches!(
            record(3, "0").amount(),
            Err(Error::InvalidRecord { id: 3, .. })
        ));
    }

    #[test]
    fn negative_amount_is_invalid() {
        assert!(matches!(
            record(4, "-5").amount(),
            Err(Error::InvalidRecord { id: 4, .. })
        ));
    }

    #[test]
    fn non_numeric_amount_is_invalid() {
        assert!(matches!(
            record(5, "twelve").amount(),
            Err(Error::InvalidRecord { id: 5, .. })
        ));
    }

    #[test]
    fn missing_amount_is_invalid() {
        assert!(matches!(
            record(6, "  ").amount(),
            Err(Error::InvalidRecord { id: 6, .. })
        ));
    }

    #[test]
    fn max_amount_is_one_trillion() {
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000_i64));
    }

    #[test]
    fn amount_at_maximum_is_valid() {
        assert_eq!(record(7, "1000000000000").amount(), Ok(MAX_AMOUNT));
    }

    #[test]
    fn amount_above_maximum_is_invalid() {
        for raw_amount in ["1000000000000.01", "1000000000000000000000000000"] {
            assert!(
                matches!(
                    record(8, raw_amount).amount(),
                    Err(Error::InvalidRecord { id: 8, .. })
                ),
                "amount {raw_amount:?}"
            );
        }
    }

    #[test]
    fn sorts_by_date_then_creation_time_then_id() {
        let mut older = record(1, "1");
        older.date = date!(2025 - 01 - 14);
        let mut created_first = record(2, "1");
        created_first.created_at = datetime!(2025-01-15 09:00 UTC);
        let created_later = record(3, "1");
        let same_time_higher_id = record(4, "1");
        let mut records = vec![
            older.clone(),
            created_first.clone(),
            created_later.clone(),
            same_time_higher_id.clone(),
        ];

        sort_for_display(&mut records);

        let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }
}
