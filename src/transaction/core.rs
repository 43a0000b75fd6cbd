//! Defines the core data models for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{CategoryId, Error, OwnerId, TransactionId};

/// A positive amount of money as a fixed-point string with two fraction digits.
///
/// This is the canonical representation of currency in the database, e.g.
/// `1234.5` is stored as `"1234.50"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    /// Create an amount from a number of currency units.
    ///
    /// Values exactly halfway between two cents round up, so `0.125` is
    /// `"0.13"`. Values such as `2.675` that are stored just below the
    /// halfway point round down.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if `value` is not finite or not greater than zero.
    pub fn new(value: f64) -> Result<Self, Error> {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::InvalidAmount(value.to_string()));
        }

        Ok(Self(format!("{:.2}", round_half_up_to_cents(value))))
    }

    /// The amount as a decimal string, e.g. `"10.00"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `{:.2}` rounds exact halves to even, so exact halves are rounded up here first.
fn round_half_up_to_cents(value: f64) -> f64 {
    // Only odd multiples of 1/8 lie exactly halfway between two cents.
    let eighths = value * 8.0;

    if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        (value * 100.0).ceil() / 100.0
    } else {
        value
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidAmount(s.to_owned()))
            .and_then(|value| Amount::new(value).map_err(|_| Error::InvalidAmount(s.to_owned())))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Self)
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Whether money came in or went out is decided by the transaction's category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user the transaction belongs to.
    pub owner_id: OwnerId,
    /// The category of the transaction, e.g. "MERCADO", "SALÁRIO".
    pub category_id: CategoryId,
    /// The amount of money spent or earned in this transaction.
    pub amount: Amount,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// An optional note about what the transaction was for.
    pub comment: Option<String>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to record a new transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user the transaction belongs to.
    pub owner_id: OwnerId,
    /// The category of the transaction, which must belong to the same user.
    pub category_id: CategoryId,
    /// The amount of money spent or earned.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// An optional note, `None` rather than an empty string when absent.
    pub comment: Option<String>,
}

/// A partial update to a transaction, only the fields set to `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    /// The new category.
    pub category_id: Option<CategoryId>,
    /// The new amount.
    pub amount: Option<Amount>,
    /// The new date.
    pub date: Option<OffsetDateTime>,
    /// The new comment, `Some(None)` clears it.
    pub comment: Option<Option<String>>,
}

impl TransactionUpdate {
    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.comment.is_none()
    }
}
