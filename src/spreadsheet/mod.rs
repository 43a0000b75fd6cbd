//! Bulk import of transactions from spreadsheet uploads.
//!
//! An upload goes through these steps:
//! 1. [read_workbook] extracts the outflow and inflow rows of every sheet.
//! 2. Rows are validated and normalized, rejected rows are silently dropped.
//! 3. [reconcile_spreadsheet] resolves every category the accepted rows refer
//!    to, creating the missing ones in one grouped insert, and then stores all
//!    transactions in one grouped insert.

mod date;
mod reconcile;
mod row;
mod upload;
mod workbook;

pub(crate) use date::parse_date_text;
pub use date::normalize_date;
pub use reconcile::{IngestionStore, UpdateResult, reconcile_spreadsheet};
pub use row::{CellValue, RawMovementRow, SheetData, SheetRows};
pub use upload::{import_sheet_data_endpoint, import_spreadsheet_endpoint};
pub use workbook::read_workbook;
