//! Income and expense transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the `Amount` currency type
//! - Database functions for storing, querying, and managing transactions
//! - JSON endpoints for recording, listing, editing and deleting single transactions

mod core;
mod create_endpoint;
mod db;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod list_endpoint;

pub use core::{Amount, NewTransaction, Transaction, TransactionUpdate};
pub use create_endpoint::create_transaction_endpoint;
pub use db::{
    count_transactions, create_transaction, create_transaction_table, create_transactions,
    delete_transaction, get_transaction, get_transactions, update_transaction,
};
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use form::{AmountInput, MAX_COMMENT_LENGTH, TransactionForm, TransactionPatch, TransactionResponse};
pub use list_endpoint::{get_transaction_endpoint, list_transactions_endpoint};
