//! Request bodies for creating and editing transactions.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::{
    Amount, CategoryId, Error, NewTransaction, OwnerId, Transaction, TransactionUpdate,
    spreadsheet::parse_date_text,
};

/// The longest comment accepted, in characters.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// The body of a request to record a transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The category, which must belong to the owner.
    pub category_id: CategoryId,
    /// How much money moved, rounded to cents.
    pub amount: f64,
    /// When the transaction happened, e.g. `2024-03-05` or `05/03/2024`.
    pub date: String,
    /// An optional note, trimmed and at most [MAX_COMMENT_LENGTH] characters.
    #[serde(default)]
    pub comment: Option<String>,
}

impl TransactionForm {
    /// Validate the form and turn it into a transaction of `owner_id`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount], [Error::InvalidDate] or
    /// [Error::CommentTooLong] for the first field that is not valid.
    pub fn into_new_transaction(self, owner_id: OwnerId) -> Result<NewTransaction, Error> {
        Ok(NewTransaction {
            owner_id,
            category_id: self.category_id,
            amount: Amount::new(self.amount)?,
            date: parse_date(&self.date)?,
            comment: parse_comment(self.comment)?,
        })
    }
}

/// The body of a request to change some fields of a transaction.
///
/// Fields left out of the request are not changed, and a `null` comment
/// clears the comment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    /// The new category.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// A number or decimal string with at most two fraction digits, e.g. `"123.45"`.
    #[serde(default)]
    pub amount: Option<AmountInput>,
    /// The new date, read like a spreadsheet date.
    #[serde(default)]
    pub date: Option<String>,
    /// The new comment, `Some(None)` for an explicit `null`.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub comment: Option<Option<String>>,
}

impl TransactionPatch {
    /// Validate the patch and turn it into a [TransactionUpdate].
    ///
    /// # Errors
    /// Returns an [Error::EmptyUpdate] if the patch has no fields, otherwise
    /// the error for the first field that is not valid.
    pub fn into_update(self) -> Result<TransactionUpdate, Error> {
        let update = TransactionUpdate {
            category_id: self.category_id,
            amount: self.amount.map(parse_exact_amount).transpose()?,
            date: self.date.as_deref().map(parse_date).transpose()?,
            comment: self.comment.map(parse_comment).transpose()?,
        };

        if update.is_empty() {
            return Err(Error::EmptyUpdate);
        }

        Ok(update)
    }
}

/// An amount sent as either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// A JSON number, e.g. `12.5`.
    Number(f64),
    /// A JSON string, e.g. `"12.50"`.
    Text(String),
}

/// The body of a response that carries a single transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Always `true`, failures are sent as an error response.
    pub success: bool,
    /// The created or updated transaction.
    pub transaction: Transaction,
}

/// Tells a present `null` apart from a missing field.
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn parse_date(text: &str) -> Result<OffsetDateTime, Error> {
    parse_date_text(text).ok_or_else(|| Error::InvalidDate(text.to_owned()))
}

/// Trim the comment, an empty comment is no comment.
fn parse_comment(comment: Option<String>) -> Result<Option<String>, Error> {
    let Some(comment) = comment else {
        return Ok(None);
    };

    let comment = comment.trim();

    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(Error::CommentTooLong(MAX_COMMENT_LENGTH));
    }

    Ok(Some(comment.to_owned()).filter(|comment| !comment.is_empty()))
}

/// Parse an amount that must already be written with at most two fraction digits.
fn parse_exact_amount(input: AmountInput) -> Result<Amount, Error> {
    let text = match input {
        AmountInput::Number(number) => number.to_string(),
        AmountInput::Text(text) => text.trim().to_owned(),
    };

    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "0"));
    let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());

    if !is_digits(whole) || !is_digits(fraction) || fraction.len() > 2 {
        return Err(Error::InvalidAmount(text));
    }

    text.parse()
}

#[cfg(test)]
mod transaction_form_tests {
    use time::macros::datetime;

    use crate::{
        Amount, Error, OwnerId, TransactionUpdate,
        transaction::form::{
            AmountInput, MAX_COMMENT_LENGTH, TransactionForm, TransactionPatch,
        },
    };

    fn form() -> TransactionForm {
        TransactionForm {
            category_id: 1,
            amount: 10.125,
            date: "05/03/2024".to_owned(),
            comment: Some("  feira ".to_owned()),
        }
    }

    #[test]
    fn form_is_normalized() {
        let transaction = form().into_new_transaction(OwnerId::new("user-1")).unwrap();

        assert_eq!(transaction.amount.as_str(), "10.13");
        assert_eq!(transaction.date, datetime!(2024-03-05 0:00 UTC));
        assert_eq!(transaction.comment.as_deref(), Some("feira"));
    }

    #[test]
    fn form_rejects_bad_fields() {
        let owner = OwnerId::new("user-1");

        let bad_amount = TransactionForm {
            amount: -1.0,
            ..form()
        };
        let bad_date = TransactionForm {
            date: "amanhã".to_owned(),
            ..form()
        };
        let long_comment = TransactionForm {
            comment: Some("a".repeat(MAX_COMMENT_LENGTH + 1)),
            ..form()
        };

        assert!(matches!(
            bad_amount.into_new_transaction(owner.clone()),
            Err(Error::InvalidAmount(_))
        ));
        assert_eq!(
            bad_date.into_new_transaction(owner.clone()),
            Err(Error::InvalidDate("amanhã".to_owned()))
        );
        assert_eq!(
            long_comment.into_new_transaction(owner),
            Err(Error::CommentTooLong(MAX_COMMENT_LENGTH))
        );
    }

    #[test]
    fn patch_reads_present_null_comment_as_clear() {
        let patch: TransactionPatch = serde_json::from_str(r#"{"comment": null}"#).unwrap();

        assert_eq!(
            patch.into_update(),
            Ok(TransactionUpdate {
                comment: Some(None),
                ..Default::default()
            })
        );
    }

    #[test]
    fn patch_with_no_fields_is_rejected() {
        let patch: TransactionPatch = serde_json::from_str("{}").unwrap();

        assert_eq!(patch.into_update(), Err(Error::EmptyUpdate));
    }

    #[test]
    fn patch_amount_accepts_numbers_and_strings() {
        for (amount, want) in [
            (AmountInput::Text("123.45".to_owned()), "123.45"),
            (AmountInput::Text(" 7 ".to_owned()), "7.00"),
            (AmountInput::Number(12.5), "12.50"),
        ] {
            let patch = TransactionPatch {
                amount: Some(amount),
                ..Default::default()
            };

            let update = patch.into_update().unwrap();

            assert_eq!(update.amount, Some(want.parse::<Amount>().unwrap()));
        }
    }

    #[test]
    fn patch_amount_must_have_at_most_two_fraction_digits() {
        for text in ["1.005", "12.", ".5", "-1", "1,50", "abc", "0"] {
            let patch = TransactionPatch {
                amount: Some(AmountInput::Text(text.to_owned())),
                ..Default::default()
            };

            assert!(
                matches!(patch.into_update(), Err(Error::InvalidAmount(_))),
                "amount {text:?}"
            );
        }
    }

    #[test]
    fn patch_trims_comment_and_empties_it() {
        let patch = TransactionPatch {
            comment: Some(Some("   ".to_owned())),
            ..Default::default()
        };

        assert_eq!(patch.into_update().unwrap().comment, Some(None));
    }
}
