use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use spendlog::{ExpensePayload, ExpenseStore, OwnerId, SQLiteExpenseStore, initialize_db};

/// A utility for creating a database with demo expenses for spendlog.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The user ID the identity provider will send for the demo user.
    #[arg(long, default_value = "demo")]
    owner_id: String,
}

/// Description, category, amount and payment method of each demo expense.
const DEMO_EXPENSES: [(&str, &str, &str, &str); 12] = [
    ("Weekly groceries", "Food", "84.20", "Debit Card"),
    ("Bus pass", "Transport", "45.00", "Credit Card"),
    ("Lunch with friends", "Food", "23.50", "Cash"),
    ("Electricity bill", "Utilities", "112.75", "Transfer"),
    ("Cinema tickets", "Entertainment", "31.00", "Credit Card"),
    ("Coffee", "Food", "4.80", "Cash"),
    ("Petrol", "Transport", "68.40", "Debit Card"),
    ("Internet", "Utilities", "59.99", "Transfer"),
    ("Concert", "Entertainment", "95.00", "Credit Card"),
    ("Bakery", "Food", "7.35", "Cash"),
    ("Taxi home", "Transport", "18.60", "Credit Card"),
    ("Pharmacy", "Health", "26.15", "Debit Card"),
];

/// How many times the demo expenses are repeated, a week apart.
const WEEKS: i64 = 8;

/// Create and populate a database for trying out the app.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let owner = OwnerId::new(&args.owner_id)?;

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    let store = SQLiteExpenseStore::new(Arc::new(Mutex::new(connection)));
    let today = OffsetDateTime::now_utc().date();

    println!("Adding demo expenses for {owner}...");

    for week in 0..WEEKS {
        for (day, (description, category, amount, payment_method)) in
            DEMO_EXPENSES.iter().enumerate()
        {
            let days_ago = week * 7 + (day as i64 % 7);

            store.create(
                &owner,
                &ExpensePayload {
                    description: description.to_string(),
                    category: category.to_string(),
                    date: today - Duration::days(days_ago),
                    amount: Decimal::from_str(amount)?,
                    payment_method: payment_method.to_string(),
                },
            )?;
        }
    }

    println!("Added {} expenses.", WEEKS as usize * DEMO_EXPENSES.len());
    println!("Success!");

    Ok(())
}
