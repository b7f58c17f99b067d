//! Implements the expense store on top of a SQLite database.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, types::Value};
use time::OffsetDateTime;

use crate::{Error, session::OwnerId};

use super::{ExpenseId, ExpensePayload, ExpenseRecord, ExpenseStore};

/// Stores expenses in the `expense` table of a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a store that uses `connection`.
    ///
    /// The expense table must already exist, see [create_expense_table].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::StoreUnavailable("could not acquire the database lock".to_owned())
        })
    }
}

/// Create the table for expenses.
///
/// Amounts are stored as text so that no precision is lost.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL CHECK (owner_id <> ''),
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            amount TEXT NOT NULL,
            date TEXT NOT NULL,
            payment_method TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_owner ON expense(owner_id);",
    )
}

impl ExpenseStore for SQLiteExpenseStore {
    fn create(&self, owner: &OwnerId, payload: &ExpensePayload) -> Result<ExpenseId, Error> {
        let connection = self.lock()?;

        let id = connection
            .prepare(
                "INSERT INTO expense
                    (owner_id, description, category, amount, date, payment_method, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING id",
            )?
            .query_row(
                (
                    owner.as_str(),
                    &payload.description,
                    &payload.category,
                    payload.amount.to_string(),
                    payload.date,
                    &payload.payment_method,
                    OffsetDateTime::now_utc(),
                ),
                |row| row.get(0),
            )?;

        Ok(id)
    }

    fn update(
        &self,
        owner: &OwnerId,
        id: ExpenseId,
        payload: &ExpensePayload,
    ) -> Result<(), Error> {
        let connection = self.lock()?;

        let rows_affected = connection.execute(
            "UPDATE expense
             SET description = ?1, category = ?2, amount = ?3, date = ?4, payment_method = ?5
             WHERE id = ?6 AND owner_id = ?7",
            (
                &payload.description,
                &payload.category,
                payload.amount.to_string(),
                payload.date,
                &payload.payment_method,
                id,
                owner.as_str(),
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::UpdateMissingExpense);
        }

        Ok(())
    }

    fn delete(&self, owner: &OwnerId, id: ExpenseId) -> Result<(), Error> {
        let connection = self.lock()?;

        let rows_affected = connection.execute(
            "DELETE FROM expense WHERE id = ?1 AND owner_id = ?2",
            (id, owner.as_str()),
        )?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingExpense);
        }

        Ok(())
    }

    fn get(&self, owner: &OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error> {
        let connection = self.lock()?;

        let record = connection
            .prepare(
                "SELECT id, owner_id, description, category, amount, date, payment_method, created_at
                 FROM expense
                 WHERE id = ?1 AND owner_id = ?2",
            )?
            .query_row((id, owner.as_str()), map_expense_row)?;

        Ok(record)
    }

    fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<ExpenseRecord>, Error> {
        let connection = self.lock()?;

        connection
            .prepare(
                "SELECT id, owner_id, description, category, amount, date, payment_method, created_at
                 FROM expense
                 WHERE owner_id = ?1",
            )?
            .query_map([owner.as_str()], map_expense_row)?
            .map(|maybe_record| maybe_record.map_err(Error::from))
            .collect()
    }
}

/// Read the amount column as text, whatever type SQLite has stored it as.
///
/// Anything that is not a positive number is reported later by
/// [ExpenseRecord::amount].
fn raw_amount(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => text,
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// A stored date or creation time that cannot be read fails the whole
/// listing, unlike an invalid amount.
fn map_expense_row(row: &Row) -> Result<ExpenseRecord, rusqlite::Error> {
    let owner_id: String = row.get(1)?;
    let owner_id = OwnerId::new(&owner_id).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })?;

    Ok(ExpenseRecord {
        id: row.get(0)?,
        owner_id,
        description: row.get(2)?,
        category: row.get(3)?,
        raw_amount: raw_amount(row.get(4)?),
        date: row.get(5)?,
        payment_method: row.get(6)?,
        created_at: row.get(7)?,
    })
}
