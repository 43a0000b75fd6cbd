//! Category creation endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, OwnerId,
    category::{Category, CategoryName, Direction, create_category},
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub owner_id: OwnerId,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            owner_id: state.owner_id.clone(),
        }
    }
}

/// The body of a request to create a category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryForm {
    /// The category name, it is trimmed and upper cased before it is stored.
    pub name: String,
    /// Whether the category is for income or expenses.
    pub direction: Direction,
}

/// Handle a request to create a category, responding with the new category.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let category = create_category(&state.owner_id, name, form.direction, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}
