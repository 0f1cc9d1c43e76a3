//! Database operations for invoice requests
//!
//! Uses parameterized queries exclusively. The external token is written
//! once at insert time; no code path updates it afterwards.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::model::{InvoiceRequest, RequestState};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

const REQUEST_COLUMNS: &str =
    "id, partner_id, sale_id, invoice_id, state, external_token, request_date, processing_date";

/// Initialize the database schema
///
/// Creates the `invoice_requests` table if it doesn't exist. Sale orders,
/// partners and invoices live in the ERP; only their ids are stored here.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS invoice_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            partner_id INTEGER NOT NULL,
            sale_id INTEGER,
            invoice_id INTEGER,
            state TEXT NOT NULL DEFAULT 'pending',
            external_token TEXT NOT NULL UNIQUE,
            request_date TEXT NOT NULL,
            processing_date TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_invoice_requests_partner ON invoice_requests(partner_id);
        CREATE INDEX IF NOT EXISTS idx_invoice_requests_invoice ON invoice_requests(invoice_id);
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

/// Current timestamp in the storage format.
pub fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn row_to_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<InvoiceRequest> {
    let state_raw: String = row.get(4)?;
    let state = RequestState::parse(&state_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown request state '{state_raw}'").into(),
        )
    })?;
    Ok(InvoiceRequest {
        id: row.get(0)?,
        partner_id: row.get(1)?,
        sale_id: row.get(2)?,
        invoice_id: row.get(3)?,
        state,
        external_token: row.get(5)?,
        request_date: row.get(6)?,
        processing_date: row.get(7)?,
    })
}

/// Insert a new pending request with a freshly generated token
pub fn insert_request(
    conn: &Connection,
    partner_id: i64,
    sale_id: Option<i64>,
) -> DbResult<InvoiceRequest> {
    let token = Uuid::new_v4().to_string();
    let request_date = now_timestamp();
    conn.execute(
        "INSERT INTO invoice_requests (partner_id, sale_id, state, external_token, request_date)
         VALUES (?1, ?2, 'pending', ?3, ?4)",
        params![partner_id, sale_id, &token, &request_date],
    )?;
    let id = conn.last_insert_rowid();
    log::info!("Created invoice request {id} for partner {partner_id} (sale {sale_id:?})");
    Ok(InvoiceRequest {
        id,
        partner_id,
        sale_id,
        invoice_id: None,
        state: RequestState::Pending,
        external_token: token,
        request_date,
        processing_date: None,
    })
}

/// Fetch one request by id
pub fn request_by_id(conn: &Connection, id: i64) -> DbResult<Option<InvoiceRequest>> {
    conn.query_row(
        &format!("SELECT {REQUEST_COLUMNS} FROM invoice_requests WHERE id = ?1"),
        params![id],
        row_to_request,
    )
    .optional()
}

/// Fetch one request by its external token (exact match)
pub fn request_by_token(conn: &Connection, token: &str) -> DbResult<Option<InvoiceRequest>> {
    conn.query_row(
        &format!("SELECT {REQUEST_COLUMNS} FROM invoice_requests WHERE external_token = ?1"),
        params![token],
        row_to_request,
    )
    .optional()
}

/// Fetch the partner's most recent request, if any
pub fn latest_request_for_partner(
    conn: &Connection,
    partner_id: i64,
) -> DbResult<Option<InvoiceRequest>> {
    conn.query_row(
        &format!(
            "SELECT {REQUEST_COLUMNS} FROM invoice_requests
             WHERE partner_id = ?1
             ORDER BY request_date DESC, id DESC
             LIMIT 1"
        ),
        params![partner_id],
        row_to_request,
    )
    .optional()
}

/// Fetch any request referencing the given invoice
pub fn request_referencing_invoice(
    conn: &Connection,
    invoice_id: i64,
) -> DbResult<Option<InvoiceRequest>> {
    conn.query_row(
        &format!(
            "SELECT {REQUEST_COLUMNS} FROM invoice_requests
             WHERE invoice_id = ?1
             ORDER BY id DESC
             LIMIT 1"
        ),
        params![invoice_id],
        row_to_request,
    )
    .optional()
}

/// List all requests, most recent first
pub fn list_requests(conn: &Connection) -> DbResult<Vec<InvoiceRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM invoice_requests ORDER BY request_date DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], row_to_request)?;
    rows.collect()
}

/// Move a pending request to `approved` in one guarded statement
///
/// Sets the invoice reference, state and processing date together; the
/// `state = 'pending'` guard makes a lost race a no-op instead of a double
/// approval. Returns whether a row was updated.
pub fn mark_approved(
    conn: &Connection,
    request_id: i64,
    invoice_id: i64,
    processing_date: &str,
) -> DbResult<bool> {
    let updated = conn.execute(
        "UPDATE invoice_requests
         SET invoice_id = ?1, state = 'approved', processing_date = ?2
         WHERE id = ?3 AND state = 'pending'",
        params![invoice_id, processing_date, request_id],
    )?;
    Ok(updated == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_generates_unique_tokens() {
        let conn = test_conn();
        let a = insert_request(&conn, 7, Some(55)).unwrap();
        let b = insert_request(&conn, 7, None).unwrap();
        assert_ne!(a.external_token, b.external_token);
        assert_eq!(a.state, RequestState::Pending);
        assert!(a.processing_date.is_none());
    }

    #[test]
    fn token_lookup_is_exact_match() {
        let conn = test_conn();
        let request = insert_request(&conn, 7, Some(55)).unwrap();
        let found = request_by_token(&conn, &request.external_token).unwrap();
        assert_eq!(found.unwrap().id, request.id);

        let prefix = &request.external_token[..8];
        assert!(request_by_token(&conn, prefix).unwrap().is_none());
        assert!(request_by_token(&conn, "").unwrap().is_none());
    }

    #[test]
    fn latest_request_wins_for_partner() {
        let conn = test_conn();
        insert_request(&conn, 7, Some(55)).unwrap();
        let newer = insert_request(&conn, 7, Some(56)).unwrap();
        insert_request(&conn, 8, Some(57)).unwrap();

        let found = latest_request_for_partner(&conn, 7).unwrap().unwrap();
        assert_eq!(found.id, newer.id);
        assert!(latest_request_for_partner(&conn, 99).unwrap().is_none());
    }

    #[test]
    fn mark_approved_sets_all_fields_once() {
        let conn = test_conn();
        let request = insert_request(&conn, 7, Some(55)).unwrap();

        let updated = mark_approved(&conn, request.id, 301, "2026-08-05 12:00:00").unwrap();
        assert!(updated);

        let stored = request_by_id(&conn, request.id).unwrap().unwrap();
        assert_eq!(stored.state, RequestState::Approved);
        assert_eq!(stored.invoice_id, Some(301));
        assert_eq!(stored.processing_date.as_deref(), Some("2026-08-05 12:00:00"));
        // The token survives approval untouched
        assert_eq!(stored.external_token, request.external_token);

        // A second approval attempt must not touch the row
        let updated = mark_approved(&conn, request.id, 999, "2026-08-06 00:00:00").unwrap();
        assert!(!updated);
        let stored = request_by_id(&conn, request.id).unwrap().unwrap();
        assert_eq!(stored.invoice_id, Some(301));
    }

    #[test]
    fn invoice_reference_lookup() {
        let conn = test_conn();
        let request = insert_request(&conn, 7, Some(55)).unwrap();
        assert!(request_referencing_invoice(&conn, 301).unwrap().is_none());

        mark_approved(&conn, request.id, 301, &now_timestamp()).unwrap();
        let found = request_referencing_invoice(&conn, 301).unwrap().unwrap();
        assert_eq!(found.id, request.id);
    }

    #[test]
    fn schema_and_rows_survive_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("requests.db");

        let token = {
            let conn = Connection::open(&path).unwrap();
            init_schema(&conn).unwrap();
            insert_request(&conn, 7, Some(55)).unwrap().external_token
        };

        let conn = Connection::open(&path).unwrap();
        init_schema(&conn).unwrap();
        let request = request_by_token(&conn, &token).unwrap().unwrap();
        assert_eq!(request.partner_id, 7);
        assert_eq!(request.sale_id, Some(55));
    }

    #[test]
    fn list_orders_most_recent_first() {
        let conn = test_conn();
        let a = insert_request(&conn, 7, Some(55)).unwrap();
        let b = insert_request(&conn, 8, Some(56)).unwrap();
        let requests = list_requests(&conn).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].id, b.id);
        assert_eq!(requests[1].id, a.id);
    }
}
