//! Categories that classify transactions as a kind of income or expense.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    create_categories, create_category, create_category_table, delete_category,
    find_categories, get_categories, get_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryKey, CategoryName, Direction};
pub use edit::update_category_endpoint;
pub use list::{get_category_endpoint, list_categories_endpoint};
