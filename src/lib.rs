//! Fintrack is a personal finance tracker.
//!
//! Users record income and expense transactions tagged with categories, and
//! bulk-import transactions from spreadsheet uploads. This library provides
//! the storage layer, the spreadsheet ingestion pipeline and a small JSON API
//! for categories, transactions and spreadsheet uploads.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod category;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod owner;
mod routing;
mod spreadsheet;
mod transaction;

pub use app_state::AppState;
pub use category::{
    Category, CategoryKey, CategoryName, Direction, create_categories, create_category,
    delete_category, find_categories, get_categories, get_category, update_category,
};
pub use database_id::{CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use owner::OwnerId;
pub use routing::build_router;
pub use spreadsheet::{
    CellValue, IngestionStore, RawMovementRow, SheetData, SheetRows, UpdateResult,
    normalize_date, read_workbook, reconcile_spreadsheet,
};
pub use transaction::{
    Amount, AmountInput, MAX_COMMENT_LENGTH, NewTransaction, Transaction, TransactionForm,
    TransactionPatch, TransactionResponse, TransactionUpdate, count_transactions,
    create_transaction, create_transactions, delete_transaction, get_transaction,
    get_transactions, update_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// A direction other than "inflow" or "outflow" was given.
    #[error("\"{0}\" is not a valid direction, expected \"inflow\" or \"outflow\"")]
    InvalidDirection(String),

    /// An amount that is not a positive, finite number was given.
    #[error("\"{0}\" is not a valid amount, expected a positive number such as 123.45")]
    InvalidAmount(String),

    /// A date that could not be read was given.
    #[error("\"{0}\" is not a valid date, expected a date such as 2024-03-05 or 05/03/2024")]
    InvalidDate(String),

    /// A comment longer than the allowed number of characters was given.
    #[error("the comment is too long, the maximum is {0} characters")]
    CommentTooLong(usize),

    /// An update request did not contain any fields to change.
    #[error("the update does not contain any fields to change")]
    EmptyUpdate,

    /// The owner already has a category with this name.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategory(String),

    /// Tried to delete a category that still has transactions.
    #[error("the category cannot be deleted because it has associated transactions")]
    CategoryInUse,

    /// The category ID used for a transaction does not refer to a category
    /// owned by the same user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// The uploaded file is not an `.xlsx` spreadsheet.
    #[error("only .xlsx files are allowed")]
    NotXlsx,

    /// The multipart form could not be parsed or did not contain a file.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The spreadsheet could not be opened or one of its sheets could not be read.
    #[error("could not read the spreadsheet: {0}")]
    InvalidSpreadsheet(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyCategoryName
            | Error::InvalidDirection(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_)
            | Error::CommentTooLong(_)
            | Error::EmptyUpdate
            | Error::InvalidCategory(_)
            | Error::NotXlsx
            | Error::MultipartError(_)
            | Error::InvalidSpreadsheet(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory => StatusCode::NOT_FOUND,
            Error::DuplicateCategory(_) | Error::CategoryInUse => StatusCode::CONFLICT,
            Error::DatabaseLockError | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal errors are logged in full but only summarised for the client.
        let (message, details) = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            (
                "Something went wrong".to_owned(),
                Some("An unexpected error occurred, check the server logs for more details."),
            )
        } else {
            (self.to_string(), None)
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": message,
                "details": details,
            })),
        )
            .into_response()
    }
}
