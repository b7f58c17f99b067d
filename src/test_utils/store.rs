use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, macros::format_description};

use crate::{
    Error,
    config::ViewConfig,
    expense::{
        ExpenseId, ExpensePayload, ExpenseRecord, ExpenseState, ExpenseStore, SQLiteExpenseStore,
        create_expense_table,
    },
    session::{OwnerId, Session},
};

/// An expense store whose backend is always down.
pub(crate) struct FailingExpenseStore;

impl FailingExpenseStore {
    fn unavailable<T>() -> Result<T, Error> {
        Err(Error::StoreUnavailable("database is locked".to_owned()))
    }
}

impl ExpenseStore for FailingExpenseStore {
    fn create(&self, _: &OwnerId, _: &ExpensePayload) -> Result<ExpenseId, Error> {
        Self::unavailable()
    }

    fn update(&self, _: &OwnerId, _: ExpenseId, _: &ExpensePayload) -> Result<(), Error> {
        Self::unavailable()
    }

    fn delete(&self, _: &OwnerId, _: ExpenseId) -> Result<(), Error> {
        Self::unavailable()
    }

    fn get(&self, _: &OwnerId, _: ExpenseId) -> Result<ExpenseRecord, Error> {
        Self::unavailable()
    }

    fn list_by_owner(&self, _: &OwnerId) -> Result<Vec<ExpenseRecord>, Error> {
        Self::unavailable()
    }
}

fn state_with_store(expense_store: Arc<dyn ExpenseStore>) -> ExpenseState {
    ExpenseState {
        expense_store,
        view_config: ViewConfig::default(),
        local_timezone: "Etc/UTC".to_owned(),
    }
}

pub(crate) fn expense_state_with_connection() -> (ExpenseState, Arc<Mutex<Connection>>) {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    create_expense_table(&connection).expect("Could not create expense table.");
    let connection = Arc::new(Mutex::new(connection));
    let store = SQLiteExpenseStore::new(connection.clone());

    (state_with_store(Arc::new(store)), connection)
}

pub(crate) fn expense_state() -> ExpenseState {
    expense_state_with_connection().0
}

pub(crate) fn failing_expense_state() -> ExpenseState {
    state_with_store(Arc::new(FailingExpenseStore))
}

pub(crate) fn test_session(owner_id: &str) -> Session {
    Session {
        owner_id: OwnerId::new(owner_id).unwrap(),
        email: None,
    }
}

/// A payload paid in cash, `date` in the format YYYY-MM-DD.
pub(crate) fn payload(category: &str, amount: &str, date: &str) -> ExpensePayload {
    ExpensePayload {
        description: format!("{category} expense"),
        category: category.to_owned(),
        date: Date::parse(date, format_description!("[year]-[month]-[day]")).unwrap(),
        amount: Decimal::from_str(amount).unwrap(),
        payment_method: "Cash".to_owned(),
    }
}
