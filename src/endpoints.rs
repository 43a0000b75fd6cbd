//! The API endpoints URIs.

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to read, rename and delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to read, edit and delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for uploading an `.xlsx` spreadsheet of transactions.
pub const IMPORT_SPREADSHEET: &str = "/api/transactions/spreadsheet";
/// The route for importing transactions from already parsed spreadsheet rows.
pub const IMPORT_SHEET_DATA: &str = "/api/transactions/sheets";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with `{` and ends with the next `}`, e.g. `{category_id}`
/// in `/api/categories/{category_id}`. Only the first parameter is replaced,
/// and a path without a parameter is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}
