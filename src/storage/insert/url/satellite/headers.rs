//! HTTP header insertion (security headers, HTTP headers) for satellite tables.

use sqlx::Sqlite;
use sqlx::Transaction;

use super::super::super::utils::insert_key_value_batch;

/// Inserts security headers into url_security_headers table using batch insert.
pub(crate) async fn insert_security_headers(
    tx: &mut Transaction<'_, Sqlite>,
    url_status_id: i64,
    security_headers: &std::collections::HashMap<String, String>,
) {
    if security_headers.is_empty() {
        return;
    }

    // Convert HashMap to Vec for consistent ordering
    let headers: Vec<(&String, &String)> = security_headers.iter().collect();

    if let Err(e) = insert_key_value_batch(
        tx,
        "url_security_headers",
        "url_status_id",
        "header_name",
        "header_value",
        url_status_id,
        &headers,
        Some("ON CONFLICT(url_status_id, header_name) DO UPDATE SET header_value=excluded.header_value"),
    )
    .await
    {
        log::warn!(
            "Failed to batch insert {} security headers for url_status_id {}: {}",
            headers.len(),
            url_status_id,
            e
        );
    }
}

/// Inserts HTTP headers into url_http_headers table using batch insert.
pub(crate) async fn insert_http_headers(
    tx: &mut Transaction<'_, Sqlite>,
    url_status_id: i64,
    http_headers: &std::collections::HashMap<String, String>,
) {
    if http_headers.is_empty() {
        return;
    }

    // Convert HashMap to Vec for consistent ordering
    let headers: Vec<(&String, &String)> = http_headers.iter().collect();

    if let Err(e) = insert_key_value_batch(
        tx,
        "url_http_headers",
        "url_status_id",
        "header_name",
        "header_value",
        url_status_id,
        &headers,
        Some("ON CONFLICT(url_status_id, header_name) DO UPDATE SET header_value=excluded.header_value"),
    )
    .await
    {
        log::warn!(
            "Failed to batch insert {} HTTP headers for url_status_id {}: {}",
            headers.len(),
            url_status_id,
            e
        );
    }
}
