//! Database operations for transactions.

use rusqlite::{Connection, Row};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    CategoryId, Error, OwnerId, TransactionId,
    transaction::{NewTransaction, Transaction, TransactionUpdate},
};

const TRANSACTION_COLUMNS: &str =
    "id, owner_id, category_id, amount, date, comment, created_at, updated_at";

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category does not belong to the transaction's owner,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    ensure_category_owned(&transaction.owner_id, transaction.category_id, connection)?;

    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (owner_id, category_id, amount, date, comment, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                &transaction.owner_id,
                transaction.category_id,
                &transaction.amount,
                transaction.date.to_offset(UtcOffset::UTC),
                &transaction.comment,
                now,
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Create many transactions with one prepared statement, returning how many were inserted.
///
/// A row is only written when its category belongs to the row's owner.
///
/// **Note**: If you want transactional integrity (all or nothing), pass in a
/// transaction for `connection`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] for the first row whose category belongs to someone else,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transactions(
    transactions: &[NewTransaction],
    connection: &Connection,
) -> Result<usize, Error> {
    let now = OffsetDateTime::now_utc();

    let mut statement = connection.prepare_cached(
        "INSERT INTO \"transaction\" (owner_id, category_id, amount, date, comment, created_at, updated_at)
         SELECT ?1, id, ?3, ?4, ?5, ?6, ?6 FROM category WHERE id = ?2 AND owner_id = ?1",
    )?;

    let mut inserted = 0;
    for transaction in transactions {
        let rows_affected = statement.execute((
            &transaction.owner_id,
            transaction.category_id,
            &transaction.amount,
            transaction.date.to_offset(UtcOffset::UTC),
            &transaction.comment,
            now,
        ))?;

        if rows_affected == 0 {
            return Err(Error::InvalidCategory(Some(transaction.category_id)));
        }

        inserted += rows_affected;
    }

    Ok(inserted)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    owner_id: &OwnerId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND owner_id = ?2"
        ))?
        .query_row((id, owner_id), map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the owner's transactions, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(
    owner_id: &OwnerId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE owner_id = ?1
             ORDER BY date DESC, id DESC"
        ))?
        .query_map([owner_id], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Apply a partial update to a transaction and return the updated transaction.
///
/// An empty update returns the transaction unchanged.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if the transaction does not exist or belongs to someone else,
/// - [Error::InvalidCategory] if the new category does not belong to the owner,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    owner_id: &OwnerId,
    id: TransactionId,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let existing = get_transaction(owner_id, id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;

    if update.is_empty() {
        return Ok(existing);
    }

    if let Some(category_id) = update.category_id {
        ensure_category_owned(owner_id, category_id, connection)?;
    }

    let category_id = update.category_id.unwrap_or(existing.category_id);
    let amount = update.amount.unwrap_or(existing.amount);
    let date = update.date.unwrap_or(existing.date);
    let comment = update.comment.unwrap_or(existing.comment);

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET category_id = ?1, amount = ?2, date = ?3, comment = ?4, updated_at = ?5
             WHERE id = ?6 AND owner_id = ?7
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                category_id,
                &amount,
                date.to_offset(UtcOffset::UTC),
                &comment,
                OffsetDateTime::now_utc(),
                id,
                owner_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}

/// Delete a transaction by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the transaction does not exist or belongs to someone else,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    owner_id: &OwnerId,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the number of transactions the owner has.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(owner_id: &OwnerId, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE owner_id = ?1",
            [owner_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            date TEXT NOT NULL,
            comment TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_owner_date ON \"transaction\"(owner_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

fn ensure_category_owned(
    owner_id: &OwnerId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let owned = connection
        .prepare_cached("SELECT 1 FROM category WHERE id = ?1 AND owner_id = ?2")?
        .exists((category_id, owner_id))?;

    if owned {
        Ok(())
    } else {
        Err(Error::InvalidCategory(Some(category_id)))
    }
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        comment: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
