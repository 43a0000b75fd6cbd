//! Endpoints for reading transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, OwnerId, Transaction, TransactionId,
    transaction::{get_transaction, get_transactions},
};

/// The state needed for reading transactions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub owner_id: OwnerId,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            owner_id: state.owner_id.clone(),
        }
    }
}

/// List the owner's transactions, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionsState>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transactions(&state.owner_id, &connection).map(Json)
}

/// Get a single transaction, or 404 if the owner has no transaction with that ID.
pub async fn get_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionsState>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transaction(&state.owner_id, transaction_id, &connection).map(Json)
}
