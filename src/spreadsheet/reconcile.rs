//! Reconciles spreadsheet rows against the owner's categories and stores them as transactions.

use std::{
    collections::{BTreeSet, HashMap},
    time::Instant,
};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    CategoryId, Error, NewTransaction, OwnerId, category,
    category::{Category, CategoryKey, CategoryName},
    spreadsheet::{
        SheetData,
        date::normalize_date,
        row::{AcceptedRow, accept_row},
    },
    transaction,
};

/// The storage operations an import needs.
///
/// Each method is one grouped operation, so an import makes the same small
/// number of round trips no matter how many rows the spreadsheet has.
pub trait IngestionStore {
    /// Get the owner's categories whose name is one of `names`, in either direction.
    fn find_categories(
        &self,
        owner_id: &OwnerId,
        names: &[CategoryName],
    ) -> Result<Vec<Category>, Error>;

    /// Create categories for `keys`, returning only the ones that were inserted.
    fn create_categories(
        &self,
        owner_id: &OwnerId,
        keys: &[CategoryKey],
    ) -> Result<Vec<Category>, Error>;

    /// Store `transactions`, returning how many were inserted.
    fn create_transactions(&self, transactions: &[NewTransaction]) -> Result<usize, Error>;
}

impl IngestionStore for Connection {
    fn find_categories(
        &self,
        owner_id: &OwnerId,
        names: &[CategoryName],
    ) -> Result<Vec<Category>, Error> {
        category::find_categories(owner_id, names, self)
    }

    fn create_categories(
        &self,
        owner_id: &OwnerId,
        keys: &[CategoryKey],
    ) -> Result<Vec<Category>, Error> {
        category::create_categories(owner_id, keys, self)
    }

    fn create_transactions(&self, transactions: &[NewTransaction]) -> Result<usize, Error> {
        transaction::create_transactions(transactions, self)
    }
}

/// The outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// How many transactions were stored.
    pub inserted: usize,
    /// How many categories had to be created.
    pub created_categories: usize,
}

/// Import the rows of every sheet as transactions of `owner_id`.
///
/// Rows that are missing a category, date or amount, or whose amount is not a
/// positive number, are skipped without error. Every category the remaining
/// rows refer to is resolved before any transaction is built, and missing
/// categories are created first, so the same category is never created twice
/// in one import.
///
/// At most three storage operations are made: one category lookup, one
/// grouped category insert and one grouped transaction insert. An extra
/// lookup only happens if another import created some of the same categories
/// in the meantime.
///
/// **Note**: The storage operations are independent. Pass a database
/// transaction as `store` if the import should be all or nothing.
///
/// # Errors
/// Any error from `store` is returned as is. Categories created before a
/// failing transaction insert are not removed.
pub fn reconcile_spreadsheet<S>(
    owner_id: &OwnerId,
    sheets: &SheetData,
    store: &S,
) -> Result<UpdateResult, Error>
where
    S: IngestionStore + ?Sized,
{
    let start_time = Instant::now();
    let now = OffsetDateTime::now_utc();

    let rows = collect_accepted_rows(sheets);

    if rows.is_empty() {
        tracing::debug!(
            "No valid rows in {} sheets, nothing to import",
            sheets.len()
        );
        return Ok(UpdateResult::default());
    }

    let (category_ids, created_categories) = resolve_categories(owner_id, &rows, store)?;

    let transactions = assemble_transactions(owner_id, &rows, &category_ids, now);

    let inserted = if transactions.is_empty() {
        0
    } else {
        store.create_transactions(&transactions)?
    };

    tracing::info!(
        "Imported {inserted} transactions and created {created_categories} categories from {} sheets in {}ms",
        sheets.len(),
        start_time.elapsed().as_millis()
    );

    Ok(UpdateResult {
        inserted,
        created_categories,
    })
}

fn collect_accepted_rows(sheets: &SheetData) -> Vec<AcceptedRow<'_>> {
    sheets
        .values()
        .flat_map(|sheet| sheet.rows())
        .filter_map(|(direction, row)| accept_row(row, direction))
        .collect()
}

/// Map every category key used by `rows` to a category ID, creating missing categories.
///
/// Returns the mapping and the number of categories created.
fn resolve_categories<S>(
    owner_id: &OwnerId,
    rows: &[AcceptedRow],
    store: &S,
) -> Result<(HashMap<CategoryKey, CategoryId>, usize), Error>
where
    S: IngestionStore + ?Sized,
{
    let keys: BTreeSet<CategoryKey> = rows.iter().map(|row| row.key.clone()).collect();
    let names = unique_names(keys.iter());

    let mut category_ids: HashMap<CategoryKey, CategoryId> = store
        .find_categories(owner_id, &names)?
        .into_iter()
        .map(|category| (category.key(), category.id))
        .collect();

    let missing: Vec<CategoryKey> = keys
        .into_iter()
        .filter(|key| !category_ids.contains_key(key))
        .collect();

    if missing.is_empty() {
        return Ok((category_ids, 0));
    }

    let created = store.create_categories(owner_id, &missing)?;
    let created_count = created.len();
    category_ids.extend(
        created
            .into_iter()
            .map(|category| (category.key(), category.id)),
    );

    // Keys that were neither found nor inserted were created by a concurrent import.
    let unresolved = unique_names(missing.iter().filter(|key| !category_ids.contains_key(*key)));

    if !unresolved.is_empty() {
        tracing::debug!(
            "{} categories were created by another import, fetching their IDs",
            unresolved.len()
        );

        for category in store.find_categories(owner_id, &unresolved)? {
            category_ids.entry(category.key()).or_insert(category.id);
        }
    }

    Ok((category_ids, created_count))
}

fn unique_names<'a>(keys: impl Iterator<Item = &'a CategoryKey>) -> Vec<CategoryName> {
    keys.map(|key| key.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn assemble_transactions(
    owner_id: &OwnerId,
    rows: &[AcceptedRow],
    category_ids: &HashMap<CategoryKey, CategoryId>,
    now: OffsetDateTime,
) -> Vec<NewTransaction> {
    rows.iter()
        .filter_map(|row| {
            // Every key was resolved above, a miss here means the store lost a category.
            let Some(&category_id) = category_ids.get(&row.key) else {
                tracing::debug!(
                    "Skipping row with unresolved category {} ({})",
                    row.key.name,
                    row.key.direction
                );
                return None;
            };

            Some(NewTransaction {
                owner_id: owner_id.clone(),
                category_id,
                amount: row.amount.clone(),
                date: normalize_date(Some(row.date), now),
                comment: row.comment.clone(),
            })
        })
        .collect()
}
