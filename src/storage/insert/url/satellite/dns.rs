//! DNS record insertion (nameservers, TXT, MX) for satellite tables.

use sqlx::Sqlite;
use sqlx::Transaction;

use super::super::super::utils::{
    build_batch_insert_query, detect_txt_type, parse_json_array, parse_mx_json_array,
};

/// Inserts nameservers into url_nameservers table using batch insert.
pub(crate) async fn insert_nameservers(
    tx: &mut Transaction<'_, Sqlite>,
    url_status_id: i64,
    nameservers_json: &Option<String>,
) {
    if let Some(ns) = parse_json_array(nameservers_json) {
        if ns.is_empty() {
            return;
        }

        // Batch insert: build VALUES clause for all nameservers
        // SQLite supports up to 500 parameters per query, so we can safely batch
        let query = build_batch_insert_query(
            "url_nameservers",
            &["url_status_id", "nameserver"],
            ns.len(),
            Some("ON CONFLICT(url_status_id, nameserver) DO NOTHING"),
        );

        let mut query_builder = sqlx::query(&query);
        for nameserver in &ns {
            query_builder = query_builder.bind(url_status_id).bind(nameserver);
        }

        if let Err(e) = query_builder.execute(&mut **tx).await {
            log::warn!(
                "Failed to batch insert {} nameservers for url_status_id {}: {}",
                ns.len(),
                url_status_id,
                e
            );
        }
    }
}

/// Inserts TXT records into url_txt_records table using batch insert.
pub(crate) async fn insert_txt_records(
    tx: &mut Transaction<'_, Sqlite>,
    url_status_id: i64,
    txt_records_json: &Option<String>,
) {
    if let Some(txts) = parse_json_array(txt_records_json) {
        if txts.is_empty() {
            return;
        }

        // Pre-compute record types for all TXT records
        let txt_with_types: Vec<(&String, &'static str)> =
            txts.iter().map(|txt| (txt, detect_txt_type(txt))).collect();

        // Batch insert: build VALUES clause for all TXT records
        let query = build_batch_insert_query(
            "url_txt_records",
            &["url_status_id", "txt_record", "record_type"],
            txt_with_types.len(),
            None,
        );

        let mut query_builder = sqlx::query(&query);
        for (txt, record_type) in &txt_with_types {
            query_builder = query_builder
                .bind(url_status_id)
                .bind(*txt)
                .bind(record_type);
        }

        if let Err(e) = query_builder.execute(&mut **tx).await {
            log::warn!(
                "Failed to batch insert {} TXT records for url_status_id {}: {}",
                txt_with_types.len(),
                url_status_id,
                e
            );
        }
    }
}

/// Inserts MX records into url_mx_records table using batch insert.
pub(crate) async fn insert_mx_records(
    tx: &mut Transaction<'_, Sqlite>,
    url_status_id: i64,
    mx_records_json: &Option<String>,
) {
    if let Some(mx_records) = parse_mx_json_array(mx_records_json) {
        if mx_records.is_empty() {
            return;
        }

        // Batch insert: build VALUES clause for all MX records
        let query = build_batch_insert_query(
            "url_mx_records",
            &["url_status_id", "priority", "mail_exchange"],
            mx_records.len(),
            Some("ON CONFLICT(url_status_id, priority, mail_exchange) DO NOTHING"),
        );

        let mut query_builder = sqlx::query(&query);
        for (priority, mail_exchange) in &mx_records {
            query_builder = query_builder
                .bind(url_status_id)
                .bind(priority)
                .bind(mail_exchange);
        }

        if let Err(e) = query_builder.execute(&mut **tx).await {
            log::warn!(
                "Failed to batch insert {} MX records for url_status_id {}: {}",
                mx_records.len(),
                url_status_id,
                e
            );
        }
    }
}
