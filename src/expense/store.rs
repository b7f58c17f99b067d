//! The gateway to wherever expenses are persisted.

use crate::{Error, session::OwnerId};

use super::{ExpenseId, ExpensePayload, ExpenseRecord};

/// Persists expenses per owner.
///
/// Every operation is scoped to `owner`: an expense owned by someone else
/// behaves exactly like one that does not exist.
///
/// Any failure of the underlying storage is reported as
/// [Error::StoreUnavailable] and is not retried.
pub trait ExpenseStore: Send + Sync {
    /// Store a new expense and return its ID.
    ///
    /// The store sets the creation timestamp.
    fn create(&self, owner: &OwnerId, payload: &ExpensePayload) -> Result<ExpenseId, Error>;

    /// Replace the user-editable fields of an existing expense.
    ///
    /// The owner and creation timestamp are kept.
    ///
    /// # Errors
    /// Returns [Error::UpdateMissingExpense] if `owner` has no expense `id`.
    fn update(&self, owner: &OwnerId, id: ExpenseId, payload: &ExpensePayload)
    -> Result<(), Error>;

    /// Remove an expense.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingExpense] if `owner` has no expense `id`.
    fn delete(&self, owner: &OwnerId, id: ExpenseId) -> Result<(), Error>;

    /// Get a single expense.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `owner` has no expense `id`.
    fn get(&self, owner: &OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error>;

    /// Get all of `owner`'s expenses, in no particular order.
    fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<ExpenseRecord>, Error>;
}
