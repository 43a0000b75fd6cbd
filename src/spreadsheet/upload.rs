//! Route handlers for importing spreadsheets.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Multipart, State, multipart::Field},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, OwnerId,
    spreadsheet::{SheetData, UpdateResult, read_workbook, reconcile_spreadsheet},
};

/// The name of the multipart form field that holds the spreadsheet.
const SPREADSHEET_FIELD: &str = "planilha";

/// The state needed for importing spreadsheets.
#[derive(Debug, Clone)]
pub struct SpreadsheetImportState {
    /// The database connection for storing categories and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The owner of the imported transactions.
    pub owner_id: OwnerId,
}

impl FromRef<AppState> for SpreadsheetImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            owner_id: state.owner_id.clone(),
        }
    }
}

/// The body of a successful import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    /// Always `true`, failures are sent as an error response.
    pub success: bool,
    /// What the import stored.
    pub update_result: UpdateResult,
}

/// Route handler for importing an `.xlsx` spreadsheet uploaded as the `planilha` form field.
pub async fn import_spreadsheet_endpoint(
    State(state): State<SpreadsheetImportState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, Error> {
    let bytes = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|error| Error::MultipartError(error.body_text()))?
            .ok_or_else(|| {
                Error::MultipartError(format!("the form has no \"{SPREADSHEET_FIELD}\" file"))
            })?;

        if field.name() == Some(SPREADSHEET_FIELD) {
            break read_spreadsheet_field(field).await?;
        }
    };

    let sheets = read_workbook(&bytes)?;

    run_import(&state, &sheets).map(Json)
}

/// Route handler for importing sheet rows that were already parsed by the client.
pub async fn import_sheet_data_endpoint(
    State(state): State<SpreadsheetImportState>,
    Json(sheets): Json<SheetData>,
) -> Result<Json<ImportResponse>, Error> {
    run_import(&state, &sheets).map(Json)
}

async fn read_spreadsheet_field(field: Field<'_>) -> Result<Vec<u8>, Error> {
    let file_name = field.file_name().unwrap_or_default().to_owned();

    if !file_name.to_lowercase().ends_with(".xlsx") {
        tracing::debug!("Rejected upload '{file_name}', only .xlsx files are accepted");
        return Err(Error::NotXlsx);
    }

    let data = field.bytes().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("could not read data from multipart form field".to_owned())
    })?;

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data.to_vec())
}

/// Import `sheets` in a single database transaction.
fn run_import(
    state: &SpreadsheetImportState,
    sheets: &SheetData,
) -> Result<ImportResponse, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let tx = connection
        .unchecked_transaction()
        .inspect_err(|error| tracing::error!("could not start transaction: {error}"))?;

    let update_result = reconcile_spreadsheet(&state.owner_id, sheets, &*tx)?;

    tx.commit()
        .inspect_err(|error| tracing::error!("could not commit transaction: {error}"))?;

    Ok(ImportResponse {
        success: true,
        update_result,
    })
}
