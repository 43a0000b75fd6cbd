//! Endpoints for reading categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, CategoryId, Error, OwnerId,
    category::{Category, get_categories, get_category},
};

/// The state needed for reading categories.
#[derive(Debug, Clone)]
pub struct CategoriesState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub owner_id: OwnerId,
}

impl FromRef<AppState> for CategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            owner_id: state.owner_id.clone(),
        }
    }
}

/// List the owner's categories ordered by name.
pub async fn list_categories_endpoint(
    State(state): State<CategoriesState>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_categories(&state.owner_id, &connection).map(Json)
}

/// Get a single category, or 404 if the owner has no category with that ID.
pub async fn get_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoriesState>,
) -> Result<Json<Category>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_category(&state.owner_id, category_id, &connection).map(Json)
}
