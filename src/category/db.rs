//! Database operations for categories.

use rusqlite::{Connection, Row, ToSql};
use time::OffsetDateTime;

use crate::{
    CategoryId, Error, OwnerId,
    category::{Category, CategoryKey, CategoryName, Direction},
};

/// The most rows written by a single `INSERT` statement.
///
/// Keeps the number of bound parameters well below SQLite's limit.
const MAX_ROWS_PER_INSERT: usize = 500;

/// The most names bound to a single lookup query.
const MAX_NAMES_PER_QUERY: usize = 1000;

const CATEGORY_COLUMNS: &str = "id, owner_id, name, direction, created_at, updated_at";

/// Create a category for `owner_id` and return it with its generated ID.
///
/// This is the manual creation path, which refuses any name the owner already
/// uses, regardless of direction.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategory] if the owner already has a category called `name`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    owner_id: &OwnerId,
    name: CategoryName,
    direction: Direction,
    connection: &Connection,
) -> Result<Category, Error> {
    let name_taken = connection
        .prepare("SELECT 1 FROM category WHERE owner_id = ?1 AND name = ?2")?
        .exists((owner_id, &name))?;

    if name_taken {
        return Err(Error::DuplicateCategory(name.to_string()));
    }

    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO category (owner_id, name, direction, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row((owner_id, &name, direction, now), map_row)
        .map_err(|error| error.into())
}

/// Create a category for each of `keys` in one grouped insert.
///
/// Keys that already exist for the owner are skipped, so only the categories
/// that were actually inserted are returned. Callers that need an ID for
/// every key should look up the missing ones with [find_categories].
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_categories(
    owner_id: &OwnerId,
    keys: &[CategoryKey],
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let now = OffsetDateTime::now_utc();
    let mut created = Vec::with_capacity(keys.len());

    for chunk in keys.chunks(MAX_ROWS_PER_INSERT) {
        // ?1 is the owner and ?2 the timestamp, each row then binds a name and a direction.
        let values = (0..chunk.len())
            .map(|index| {
                let name_index = 3 + index * 2;
                format!("(?1, ?{name_index}, ?{}, ?2, ?2)", name_index + 1)
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(2 + chunk.len() * 2);
        params.push(owner_id);
        params.push(&now);
        for key in chunk {
            params.push(&key.name);
            params.push(&key.direction);
        }

        let mut statement = connection.prepare(&format!(
            "INSERT INTO category (owner_id, name, direction, created_at, updated_at)
             VALUES {values}
             ON CONFLICT(owner_id, name, direction) DO NOTHING
             RETURNING {CATEGORY_COLUMNS}"
        ))?;

        for category in statement.query_map(params.as_slice(), map_row)? {
            created.push(category?);
        }
    }

    Ok(created)
}

/// Retrieve the owner's categories whose name is one of `names`, in both directions.
///
/// Large lists of names are looked up in batches, so any number of names can be given.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn find_categories(
    owner_id: &OwnerId,
    names: &[CategoryName],
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let mut found = Vec::new();

    for chunk in names.chunks(MAX_NAMES_PER_QUERY) {
        // ?1 is the owner, the names start at ?2.
        let placeholders = (0..chunk.len())
            .map(|index| format!("?{}", index + 2))
            .collect::<Vec<_>>()
            .join(", ");

        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() + 1);
        params.push(owner_id);
        params.extend(chunk.iter().map(|name| name as &dyn ToSql));

        let mut statement = connection.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             WHERE owner_id = ?1 AND name IN ({placeholders})
             ORDER BY id ASC"
        ))?;

        for category in statement.query_map(params.as_slice(), map_row)? {
            found.push(category?);
        }
    }

    Ok(found)
}

/// Retrieve a single category by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `category_id` does not refer to a category owned by `owner_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(
    owner_id: &OwnerId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = ?1 AND owner_id = ?2"
        ))?
        .query_row((category_id, owner_id), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the owner's categories ordered alphabetically by name.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_categories(owner_id: &OwnerId, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             WHERE owner_id = ?1
             ORDER BY name ASC, direction ASC"
        ))?
        .query_map([owner_id], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Rename a category.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingCategory] if the category does not exist or belongs to someone else,
/// - [Error::DuplicateCategory] if the owner already has a category with the new name and same direction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_category(
    owner_id: &OwnerId,
    category_id: CategoryId,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "UPDATE category SET name = ?1, updated_at = ?2
             WHERE id = ?3 AND owner_id = ?4
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (&new_name, OffsetDateTime::now_utc(), category_id, owner_id),
            map_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingCategory,
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategory(new_name.to_string()),
            error => error.into(),
        })
}

/// Delete a category by ID.
///
/// Categories that still have transactions are never deleted.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingCategory] if the category does not exist or belongs to someone else,
/// - [Error::CategoryInUse] if any transaction refers to the category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(
    owner_id: &OwnerId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let exists = connection
        .prepare("SELECT 1 FROM category WHERE id = ?1 AND owner_id = ?2")?
        .exists((category_id, owner_id))?;

    if !exists {
        return Err(Error::DeleteMissingCategory);
    }

    let in_use = connection
        .prepare("SELECT 1 FROM \"transaction\" WHERE category_id = ?1 LIMIT 1")?
        .exists([category_id])?;

    if in_use {
        return Err(Error::CategoryInUse);
    }

    connection.execute(
        "DELETE FROM category WHERE id = ?1 AND owner_id = ?2",
        (category_id, owner_id),
    )?;

    Ok(())
}

/// Initialize the category table and indexes.
///
/// The unique constraint on `(owner_id, name, direction)` is what keeps
/// concurrent imports from creating the same category twice.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL,
            direction TEXT NOT NULL CHECK (direction IN ('inflow', 'outflow')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(owner_id, name, direction)
        );

        CREATE INDEX IF NOT EXISTS idx_category_owner_name ON category(owner_id, name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        direction: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

#[cfg(test)]
mod category_query_tests {
    use std::collections::HashSet;

    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Amount, Error, NewTransaction, OwnerId,
        category::{
            CategoryKey, CategoryName, Direction, create_categories, create_category,
            delete_category, find_categories, get_categories, get_category, update_category,
        },
        db::initialize,
        transaction::create_transaction,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    fn owner() -> OwnerId {
        OwnerId::new("user-1")
    }

    fn key(name: &str, direction: Direction) -> CategoryKey {
        CategoryKey::new(CategoryName::new_unchecked(name), direction)
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();
        let name = CategoryName::new("Mercado").unwrap();

        let category = create_category(&owner(), name.clone(), Direction::Outflow, &connection)
            .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name, name);
        assert_eq!(category.direction, Direction::Outflow);
        assert_eq!(category.owner_id, owner());
    }

    #[test]
    fn create_category_rejects_existing_name_in_any_direction() {
        let connection = get_test_db_connection();
        create_category(
            &owner(),
            CategoryName::new("Freelance").unwrap(),
            Direction::Inflow,
            &connection,
        )
        .unwrap();

        let result = create_category(
            &owner(),
            CategoryName::new(" freelance").unwrap(),
            Direction::Outflow,
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateCategory("FREELANCE".to_owned())));
    }

    #[test]
    fn create_category_allows_same_name_for_other_owner() {
        let connection = get_test_db_connection();
        let name = CategoryName::new("Aluguel").unwrap();
        create_category(&owner(), name.clone(), Direction::Outflow, &connection).unwrap();

        let result = create_category(
            &OwnerId::new("user-2"),
            name,
            Direction::Outflow,
            &connection,
        );

        assert!(result.is_ok());
    }

    #[test]
    fn create_categories_inserts_all_new_keys() {
        let connection = get_test_db_connection();
        let keys = [
            key("MERCADO", Direction::Outflow),
            key("MERCADO", Direction::Inflow),
            key("SALÁRIO", Direction::Inflow),
        ];

        let created = create_categories(&owner(), &keys, &connection).unwrap();

        let got: HashSet<_> = created.iter().map(|category| category.key()).collect();
        assert_eq!(got, HashSet::from(keys));
    }

    #[test]
    fn create_categories_skips_existing_keys() {
        let connection = get_test_db_connection();
        create_categories(&owner(), &[key("MERCADO", Direction::Outflow)], &connection).unwrap();

        let created = create_categories(
            &owner(),
            &[
                key("MERCADO", Direction::Outflow),
                key("FARMÁCIA", Direction::Outflow),
            ],
            &connection,
        )
        .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].key(), key("FARMÁCIA", Direction::Outflow));
        assert_eq!(get_categories(&owner(), &connection).unwrap().len(), 2);
    }

    #[test]
    fn create_categories_handles_more_rows_than_one_insert() {
        let connection = get_test_db_connection();
        let keys: Vec<_> = (0..1234)
            .map(|i| key(&format!("CATEGORY {i}"), Direction::Outflow))
            .collect();

        let created = create_categories(&owner(), &keys, &connection).unwrap();

        assert_eq!(created.len(), keys.len());
    }

    #[test]
    fn find_categories_matches_names_in_both_directions() {
        let connection = get_test_db_connection();
        create_categories(
            &owner(),
            &[
                key("MERCADO", Direction::Outflow),
                key("MERCADO", Direction::Inflow),
                key("ALUGUEL", Direction::Outflow),
            ],
            &connection,
        )
        .unwrap();
        create_categories(
            &OwnerId::new("user-2"),
            &[key("MERCADO", Direction::Outflow)],
            &connection,
        )
        .unwrap();

        let found = find_categories(
            &owner(),
            &[CategoryName::new_unchecked("MERCADO")],
            &connection,
        )
        .unwrap();

        let got: HashSet<_> = found.iter().map(|category| category.key()).collect();
        assert_eq!(
            got,
            HashSet::from([
                key("MERCADO", Direction::Outflow),
                key("MERCADO", Direction::Inflow)
            ])
        );
        assert!(found.iter().all(|category| category.owner_id == owner()));
    }

    #[test]
    fn find_categories_with_no_names_returns_nothing() {
        let connection = get_test_db_connection();

        let found = find_categories(&owner(), &[], &connection).unwrap();

        assert!(found.is_empty());
    }

    #[test]
    fn find_categories_handles_more_names_than_sqlite_parameters() {
        let connection = get_test_db_connection();
        let keys: Vec<_> = (0..33_000)
            .map(|i| key(&format!("CATEGORY {i}"), Direction::Outflow))
            .collect();
        create_categories(&owner(), &keys, &connection).unwrap();
        let names: Vec<_> = keys.iter().map(|key| key.name.clone()).collect();

        let found = find_categories(&owner(), &names, &connection).unwrap();

        assert_eq!(found.len(), keys.len());
        let got: HashSet<_> = found.into_iter().map(|category| category.key()).collect();
        assert_eq!(got, keys.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn get_category_of_other_owner_returns_not_found() {
        let connection = get_test_db_connection();
        let category = create_category(
            &owner(),
            CategoryName::new("Mercado").unwrap(),
            Direction::Outflow,
            &connection,
        )
        .unwrap();

        let result = get_category(&OwnerId::new("someone-else"), category.id, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_categories_is_sorted_by_name() {
        let connection = get_test_db_connection();
        create_categories(
            &owner(),
            &[key("ZOO", Direction::Outflow), key("ALUGUEL", Direction::Outflow)],
            &connection,
        )
        .unwrap();

        let names: Vec<_> = get_categories(&owner(), &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name.to_string())
            .collect();

        assert_eq!(names, ["ALUGUEL", "ZOO"]);
    }

    #[test]
    fn update_category_renames() {
        let connection = get_test_db_connection();
        let category = create_category(
            &owner(),
            CategoryName::new("Mercado").unwrap(),
            Direction::Outflow,
            &connection,
        )
        .unwrap();

        let updated = update_category(
            &owner(),
            category.id,
            CategoryName::new("supermercado").unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(updated.id, category.id);
        assert_eq!(updated.name.as_ref(), "SUPERMERCADO");
        assert_eq!(get_category(&owner(), category.id, &connection), Ok(updated));
    }

    #[test]
    fn update_category_with_invalid_id_returns_missing() {
        let connection = get_test_db_connection();

        let result = update_category(
            &owner(),
            999999,
            CategoryName::new_unchecked("X"),
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn update_category_to_taken_name_returns_duplicate() {
        let connection = get_test_db_connection();
        let created = create_categories(
            &owner(),
            &[key("A", Direction::Outflow), key("B", Direction::Outflow)],
            &connection,
        )
        .unwrap();
        let b = created.iter().find(|c| c.name.as_ref() == "B").unwrap();

        let result = update_category(&owner(), b.id, CategoryName::new_unchecked("A"), &connection);

        assert_eq!(result, Err(Error::DuplicateCategory("A".to_owned())));
    }

    #[test]
    fn delete_category_succeeds() {
        let connection = get_test_db_connection();
        let category = create_category(
            &owner(),
            CategoryName::new("Mercado").unwrap(),
            Direction::Outflow,
            &connection,
        )
        .unwrap();

        let result = delete_category(&owner(), category.id, &connection);

        assert_eq!(result, Ok(()));
        assert_eq!(
            get_category(&owner(), category.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_category_with_transactions_is_refused() {
        let connection = get_test_db_connection();
        let category = create_category(
            &owner(),
            CategoryName::new("Mercado").unwrap(),
            Direction::Outflow,
            &connection,
        )
        .unwrap();
        create_transaction(
            NewTransaction {
                owner_id: owner(),
                category_id: category.id,
                amount: Amount::new(10.0).unwrap(),
                date: datetime!(2024-01-01 0:00 UTC),
                comment: None,
            },
            &connection,
        )
        .unwrap();

        let result = delete_category(&owner(), category.id, &connection);

        assert_eq!(result, Err(Error::CategoryInUse));
        assert!(get_category(&owner(), category.id, &connection).is_ok());
    }

    #[test]
    fn delete_category_of_other_owner_returns_missing() {
        let connection = get_test_db_connection();
        let category = create_category(
            &owner(),
            CategoryName::new("Mercado").unwrap(),
            Direction::Outflow,
            &connection,
        )
        .unwrap();

        let result = delete_category(&OwnerId::new("user-2"), category.id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }
}
