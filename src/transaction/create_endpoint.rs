//! Defines the endpoint for recording a single transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, OwnerId,
    transaction::{
        create_transaction,
        form::{TransactionForm, TransactionResponse},
    },
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub owner_id: OwnerId,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            owner_id: state.owner_id.clone(),
        }
    }
}

/// A route handler for creating a new transaction.
///
/// The amount is rounded to cents and the category must belong to the owner.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<TransactionResponse>), Error> {
    let new_transaction = form.into_new_transaction(state.owner_id.clone())?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let transaction = create_transaction(new_transaction, &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            success: true,
            transaction,
        }),
    ))
}

#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        CategoryId, Error, OwnerId,
        category::{CategoryName, Direction, create_category},
        db::initialize,
        transaction::{count_transactions, form::TransactionForm},
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn get_state() -> CreateTransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            owner_id: OwnerId::new("user-1"),
        }
    }

    fn create_test_category(state: &CreateTransactionState, owner_id: &OwnerId) -> CategoryId {
        create_category(
            owner_id,
            CategoryName::new_unchecked("MERCADO"),
            Direction::Outflow,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn creates_transaction() {
        let state = get_state();
        let category_id = create_test_category(&state, &state.owner_id);
        let form = TransactionForm {
            category_id,
            amount: 12.3,
            date: "2024-03-05".to_owned(),
            comment: Some("feira".to_owned()),
        };

        let (status, Json(response)) = create_transaction_endpoint(State(state.clone()), Json(form))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(response.success);
        assert_eq!(response.transaction.category_id, category_id);
        assert_eq!(response.transaction.amount.as_str(), "12.30");
        assert_eq!(response.transaction.date, datetime!(2024-03-05 0:00 UTC));
        assert_eq!(response.transaction.comment.as_deref(), Some("feira"));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&state.owner_id, &connection), Ok(1));
    }

    #[tokio::test]
    async fn rejects_category_of_other_owner() {
        let state = get_state();
        let category_id = create_test_category(&state, &OwnerId::new("user-2"));
        let form = TransactionForm {
            category_id,
            amount: 12.3,
            date: "2024-03-05".to_owned(),
            comment: None,
        };

        let result = create_transaction_endpoint(State(state), Json(form)).await;

        assert!(matches!(result, Err(Error::InvalidCategory(Some(id))) if id == category_id));
    }
}
