//! Category rename endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, CategoryId, Error, OwnerId,
    category::{Category, CategoryName, update_category},
};

/// The state needed for renaming a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub owner_id: OwnerId,
}

impl FromRef<AppState> for UpdateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            owner_id: state.owner_id.clone(),
        }
    }
}

/// The body of a request to rename a category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenameCategoryForm {
    pub name: String,
}

/// Handle a request to rename a category, responding with the renamed category.
///
/// The direction of a category never changes.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<UpdateCategoryState>,
    Json(form): Json<RenameCategoryForm>,
) -> Result<Json<Category>, Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    update_category(&state.owner_id, category_id, name, &connection).map(Json)
}

#[cfg(test)]
mod update_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, State},
    };
    use rusqlite::Connection;

    use crate::{
        Error, OwnerId,
        category::{CategoryName, Direction, create_category},
        db::initialize,
    };

    use super::{RenameCategoryForm, UpdateCategoryState, update_category_endpoint};

    fn get_state() -> UpdateCategoryState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        UpdateCategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
            owner_id: OwnerId::new("user-1"),
        }
    }

    fn rename_to(name: &str) -> Json<RenameCategoryForm> {
        Json(RenameCategoryForm {
            name: name.to_owned(),
        })
    }

    #[tokio::test]
    async fn renames_category() {
        let state = get_state();
        let category = create_category(
            &state.owner_id,
            CategoryName::new_unchecked("MERCADO"),
            Direction::Outflow,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let Json(renamed) =
            update_category_endpoint(Path(category.id), State(state), rename_to("feira"))
                .await
                .unwrap();

        assert_eq!(renamed.id, category.id);
        assert_eq!(renamed.name, CategoryName::new_unchecked("FEIRA"));
        assert_eq!(renamed.direction, Direction::Outflow);
    }

    #[tokio::test]
    async fn missing_category_is_not_found() {
        let state = get_state();

        let result = update_category_endpoint(Path(42), State(state), rename_to("feira")).await;

        assert!(matches!(result, Err(Error::UpdateMissingCategory)));
    }
}
