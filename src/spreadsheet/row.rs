//! Raw spreadsheet rows and the rules for accepting them.

use std::collections::BTreeMap;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Amount,
    category::{CategoryKey, CategoryName, Direction},
};

/// The parsed rows of every sheet in a spreadsheet, keyed by sheet name.
pub type SheetData = BTreeMap<String, SheetRows>;

/// The value of a single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "JsonCell")]
pub enum CellValue {
    /// Free text, including dates and numbers the spreadsheet stored as text.
    Text(String),
    /// A numeric cell.
    Number(f64),
    /// A cell the spreadsheet stored as a date.
    Date(OffsetDateTime),
}

/// The cell values that can appear in JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonCell {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl From<JsonCell> for CellValue {
    fn from(cell: JsonCell) -> Self {
        match cell {
            JsonCell::Number(number) => CellValue::Number(number),
            JsonCell::Text(text) => CellValue::Text(text),
            JsonCell::Bool(flag) => CellValue::Text(flag.to_string()),
        }
    }
}

impl CellValue {
    /// The cell as text, numbers are written without a trailing `.0`.
    ///
    /// Date cells have no text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(text) => Some(text.clone()),
            CellValue::Number(number) => Some(number.to_string()),
            CellValue::Date(_) => None,
        }
    }

    /// Coerce the cell to a number.
    ///
    /// Blank text is zero and anything else that is not a number is `NaN`.
    pub fn to_number(&self) -> f64 {
        match self {
            CellValue::Number(number) => *number,
            CellValue::Text(text) if text.trim().is_empty() => 0.0,
            CellValue::Text(text) => text.trim().parse().unwrap_or(f64::NAN),
            CellValue::Date(_) => f64::NAN,
        }
    }

    /// Whether the cell counts as missing: empty text or a zero.
    ///
    /// Whitespace is not empty, a date cell of spaces is kept and later
    /// falls back to the import time.
    fn is_empty(&self) -> bool {
        match self {
            CellValue::Text(text) => text.is_empty(),
            CellValue::Number(number) => *number == 0.0,
            CellValue::Date(_) => false,
        }
    }
}

/// One row of the outflow or inflow columns of a sheet.
///
/// Whether `amount` is money spent or earned depends on which list of
/// [SheetRows] the row is in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMovementRow {
    /// A free text note.
    #[serde(default, alias = "comentario")]
    pub comment: Option<CellValue>,
    /// The category name as typed in the spreadsheet.
    #[serde(default, alias = "categoria")]
    pub category: Option<CellValue>,
    /// When the movement happened.
    #[serde(default, alias = "data")]
    pub date: Option<CellValue>,
    /// How much money moved.
    #[serde(default, alias = "saida", alias = "entrada")]
    pub amount: Option<CellValue>,
}

/// The outflow and inflow rows of a single sheet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRows {
    /// Expenses.
    #[serde(default, alias = "saidas")]
    pub outflow_rows: Vec<RawMovementRow>,
    /// Income.
    #[serde(default, alias = "entradas")]
    pub inflow_rows: Vec<RawMovementRow>,
}

impl SheetRows {
    /// All rows of the sheet paired with their direction, outflows first.
    pub fn rows(&self) -> impl Iterator<Item = (Direction, &RawMovementRow)> {
        self.outflow_rows
            .iter()
            .map(|row| (Direction::Outflow, row))
            .chain(self.inflow_rows.iter().map(|row| (Direction::Inflow, row)))
    }
}

/// A row that passed validation, with its category name and amount normalized.
///
/// The date is kept as the raw cell and only normalized when the transaction
/// is built.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AcceptedRow<'a> {
    pub key: CategoryKey,
    pub amount: Amount,
    pub date: &'a CellValue,
    pub comment: Option<String>,
}

/// Validate and normalize a raw row.
///
/// A row is rejected, in this order, when its category is missing or blank,
/// its date is missing, its amount is missing, or its amount is not a number
/// greater than zero.
pub(crate) fn accept_row(row: &RawMovementRow, direction: Direction) -> Option<AcceptedRow<'_>> {
    let category_text = row.category.as_ref()?.as_text()?;
    let name = CategoryName::new(&category_text).ok()?;

    let date = row.date.as_ref().filter(|date| !date.is_empty())?;

    let amount = row.amount.as_ref()?;
    let amount = Amount::new(amount.to_number()).ok()?;

    let comment = row
        .comment
        .as_ref()
        .and_then(CellValue::as_text)
        .map(|comment| comment.trim().to_owned())
        .filter(|comment| !comment.is_empty());

    Some(AcceptedRow {
        key: CategoryKey::new(name, direction),
        amount,
        date,
        comment,
    })
}


#[cfg(test)]
mod deserialize_tests {
    use crate::spreadsheet::row::{CellValue, SheetData};

    #[test]
    fn reads_spreadsheet_json_shape() {
        let json = r#"{
            "Janeiro": {
                "saidas": [
                    {"comentario": null, "categoria": "Mercado", "data": "01/01/2024", "saida": 100}
                ],
                "entradas": [
                    {"comentario": "jan", "categoria": "Salário", "data": "05/01/2024", "entrada": "5000"}
                ]
            }
        }"#;

        let sheets: SheetData = serde_json::from_str(json).expect("Could not parse JSON");

        let sheet = &sheets["Janeiro"];
        assert_eq!(sheet.outflow_rows.len(), 1);
        assert_eq!(sheet.outflow_rows[0].comment, None);
        assert_eq!(sheet.outflow_rows[0].amount, Some(CellValue::Number(100.0)));
        assert_eq!(
            sheet.inflow_rows[0].amount,
            Some(CellValue::Text("5000".to_owned()))
        );
        assert_eq!(
            sheet.inflow_rows[0].category,
            Some(CellValue::Text("Salário".to_owned()))
        );
    }

    #[test]
    fn reads_english_field_names() {
        let json = r#"{
            "Sheet1": {
                "outflowRows": [
                    {"category": "Rent", "date": "2024-03-05", "amount": 1200.5}
                ]
            }
        }"#;

        let sheets: SheetData = serde_json::from_str(json).expect("Could not parse JSON");

        let sheet = &sheets["Sheet1"];
        assert_eq!(sheet.outflow_rows.len(), 1);
        assert!(sheet.inflow_rows.is_empty());
        assert_eq!(sheet.outflow_rows[0].amount, Some(CellValue::Number(1200.5)));
    }
}
