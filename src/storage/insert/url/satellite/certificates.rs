//! Certificate-related insertion (OIDs, SANs) for satellite tables.

use sqlx::Sqlite;
use sqlx::Transaction;

use super::super::super::utils::build_batch_insert_query;

/// Inserts OIDs into url_oids table using batch insert.
pub(crate) async fn insert_oids(
    tx: &mut Transaction<'_, Sqlite>,
    url_status_id: i64,
    oids: &std::collections::HashSet<String>,
) {
    if oids.is_empty() {
        return;
    }

    // Convert HashSet to Vec for consistent ordering
    let oids_vec: Vec<&String> = oids.iter().collect();

    // Batch insert: build VALUES clause for all OIDs
    let query = build_batch_insert_query(
        "url_oids",
        &["url_status_id", "oid"],
        oids_vec.len(),
        Some("ON CONFLICT(url_status_id, oid) DO NOTHING"),
    );

    let mut query_builder = sqlx::query(&query);
    for oid in &oids_vec {
        query_builder = query_builder.bind(url_status_id).bind(*oid);
    }

    if let Err(e) = query_builder.execute(&mut **tx).await {
        log::warn!(
            "Failed to batch insert {} OIDs for url_status_id {}: {}",
            oids_vec.len(),
            url_status_id,
            e
        );
    }
}

/// Inserts certificate Subject Alternative Names (SANs) into url_certificate_sans table using batch insert.
pub(crate) async fn insert_certificate_sans(
    tx: &mut Transaction<'_, Sqlite>,
    url_status_id: i64,
    subject_alternative_names: &[String],
) {
    if subject_alternative_names.is_empty() {
        return;
    }

    // SANs are stored in a separate table to enable graph analysis (linking domains sharing certificates)
    // Batch insert: build VALUES clause for all SANs
    let query = build_batch_insert_query(
        "url_certificate_sans",
        &["url_status_id", "domain_name"],
        subject_alternative_names.len(),
        Some("ON CONFLICT(url_status_id, domain_name) DO NOTHING"),
    );

    let mut query_builder = sqlx::query(&query);
    for san in subject_alternative_names {
        query_builder = query_builder.bind(url_status_id).bind(san);
    }

    if let Err(e) = query_builder.execute(&mut **tx).await {
        log::warn!(
            "Failed to batch insert {} certificate SANs for url_status_id {}: {}",
            subject_alternative_names.len(),
            url_status_id,
            e
        );
    }
}
