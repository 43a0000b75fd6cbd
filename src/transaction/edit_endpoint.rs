//! Defines the endpoint for changing some fields of a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, OwnerId, TransactionId,
    transaction::{
        form::{TransactionPatch, TransactionResponse},
        update_transaction,
    },
};

/// The state needed for editing a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub owner_id: OwnerId,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            owner_id: state.owner_id.clone(),
        }
    }
}

/// A route handler for a partial update of a transaction.
///
/// Only the fields in the request body are changed, and at least one field must be given.
pub async fn edit_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Json(patch): Json<TransactionPatch>,
) -> Result<Json<TransactionResponse>, Error> {
    let update = patch.into_update()?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let transaction = update_transaction(&state.owner_id, transaction_id, update, &connection)?;

    Ok(Json(TransactionResponse {
        success: true,
        transaction,
    }))
}
