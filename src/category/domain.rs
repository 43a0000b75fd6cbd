//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{CategoryId, Error, OwnerId};

/// A validated, non-empty and upper case category name.
///
/// Category names are case-insensitive, so `"mercado"`, `"MERCADO"` and
/// `" Mercado "` all become `MERCADO`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name by trimming and upper casing `name`.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_uppercase()))
        }
    }

    /// Create a category name without validation or normalization.
    ///
    /// The caller should ensure that the string is not empty and already upper case.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for CategoryName {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for CategoryName {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(CategoryName::new_unchecked)
    }
}

/// Whether money came in or went out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Income, e.g. a salary payment.
    Inflow,
    /// An expense, e.g. groceries.
    Outflow,
}

impl Direction {
    /// The name used for the direction in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inflow => "inflow",
            Direction::Outflow => "outflow",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inflow" => Ok(Direction::Inflow),
            "outflow" => Ok(Direction::Outflow),
            _ => Err(Error::InvalidDirection(s.to_owned())),
        }
    }
}

impl ToSql for Direction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Direction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// Identifies a category within one owner's categories.
///
/// The same name may be used once for income and once for expenses, so the
/// name alone is not enough to find a category.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryKey {
    /// The normalized category name.
    pub name: CategoryName,
    /// Whether the category is for income or expenses.
    pub direction: Direction,
}

impl CategoryKey {
    /// Create a key from a normalized name and a direction.
    pub fn new(name: CategoryName, direction: Direction) -> Self {
        Self { name, direction }
    }
}

/// A category for expenses or income, e.g., 'MERCADO', 'ALUGUEL', 'SALÁRIO'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user the category belongs to.
    pub owner_id: OwnerId,
    /// The upper case name of the category.
    pub name: CategoryName,
    /// Whether the category is for income or expenses.
    pub direction: Direction,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the category was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Category {
    /// The key that identifies this category among its owner's categories.
    pub fn key(&self) -> CategoryKey {
        CategoryKey::new(self.name.clone(), self.direction)
    }
}
