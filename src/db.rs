//! Database initialization for the application's domain models.

use rusqlite::Connection;

use crate::{Error, category::create_category_table, transaction::create_transaction_table};

/// Create the tables for all domain models if they do not exist yet.
///
/// Foreign key enforcement is switched on for `connection` since transactions
/// must always refer to an existing category.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    transaction.commit()?;

    Ok(())
}
