//! Extracts movement rows from `.xlsx` workbooks.

use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};

use crate::{
    Error,
    spreadsheet::{CellValue, RawMovementRow, SheetData, SheetRows, date::excel_serial_to_datetime},
};

/// The zero-based row where movements start, the rows above it hold the sheet's headers.
const FIRST_MOVEMENT_ROW: u32 = 4;

/// Column B, the comment column of the outflow block.
const OUTFLOW_FIRST_COLUMN: u32 = 1;

/// Column G, the comment column of the inflow block.
const INFLOW_FIRST_COLUMN: u32 = 6;

/// Read the outflow and inflow rows of every sheet in a workbook.
///
/// Each sheet has two blocks of four columns, comment, category, date and
/// amount: outflows in columns B to E and inflows in columns G to J.
/// Movements start on the fifth row. Rows that are completely empty or whose
/// amount is empty or zero are left out.
///
/// # Errors
/// Returns [Error::InvalidSpreadsheet] if the bytes are not a workbook or a
/// sheet cannot be read.
pub fn read_workbook(bytes: &[u8]) -> Result<SheetData, Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|error| Error::InvalidSpreadsheet(error.to_string()))?;

    let mut sheets = SheetData::new();

    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|error| Error::InvalidSpreadsheet(format!("sheet \"{sheet_name}\": {error}")))?;

        let rows = extract_sheet_rows(&range);
        tracing::debug!(
            "Read {} outflow and {} inflow rows from sheet \"{sheet_name}\"",
            rows.outflow_rows.len(),
            rows.inflow_rows.len()
        );

        sheets.insert(sheet_name, rows);
    }

    Ok(sheets)
}

fn extract_sheet_rows(range: &Range<Data>) -> SheetRows {
    let Some((last_row, _)) = range.end() else {
        return SheetRows::default();
    };

    let mut rows = SheetRows::default();

    for row in FIRST_MOVEMENT_ROW..=last_row {
        if let Some(outflow) = read_movement(range, row, OUTFLOW_FIRST_COLUMN) {
            rows.outflow_rows.push(outflow);
        }

        if let Some(inflow) = read_movement(range, row, INFLOW_FIRST_COLUMN) {
            rows.inflow_rows.push(inflow);
        }
    }

    rows
}

fn read_movement(range: &Range<Data>, row: u32, first_column: u32) -> Option<RawMovementRow> {
    let cell = |offset: u32| range.get_value((row, first_column + offset)).and_then(to_cell_value);

    let movement = RawMovementRow {
        comment: cell(0),
        category: cell(1),
        date: cell(2),
        amount: cell(3),
    };

    if movement == RawMovementRow::default() || !has_amount(movement.amount.as_ref()) {
        return None;
    }

    Some(movement)
}

fn has_amount(amount: Option<&CellValue>) -> bool {
    match amount {
        None => false,
        Some(CellValue::Text(text)) => !matches!(text.trim(), "" | "0"),
        Some(CellValue::Number(number)) => *number != 0.0,
        Some(CellValue::Date(_)) => true,
    }
}

fn to_cell_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(text) => Some(CellValue::Text(text.clone())),
        Data::Float(number) => Some(CellValue::Number(*number)),
        Data::Int(number) => Some(CellValue::Number(*number as f64)),
        Data::Bool(flag) => Some(CellValue::Text(flag.to_string())),
        Data::DateTime(date_time) => excel_serial_to_datetime(date_time.as_f64()).map(CellValue::Date),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Some(CellValue::Text(text.clone())),
    }
}
