//! Invoice-request lifecycle operations.
//!
//! Two states: `pending` at creation, `approved` once an invoice has been
//! generated and posted. There are no other transitions; an approval attempt
//! on anything but a pending request with a sale order leaves the record
//! untouched.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use odoo_common::OdooApi;

use crate::error::{RequestError, Result};
use crate::model::{InvoiceRequest, RequestState};
use crate::store;

/// Outcome of an approval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveOutcome {
    /// An invoice was created and posted and the request moved to `approved`.
    Approved { invoice_id: i64 },
    /// Nothing changed: the request was not pending, had no sale order, or
    /// the order produced no invoice.
    Skipped { state: RequestState },
}

/// Records an external submission as a new pending request.
///
/// Eligibility of the sale order is the submitting endpoint's concern; this
/// only records the ask.
pub fn create_from_external_request(
    conn: &Connection,
    partner_id: i64,
    sale_id: i64,
) -> Result<InvoiceRequest> {
    Ok(store::insert_request(conn, partner_id, Some(sale_id))?)
}

/// Returns the partner's token, minting one if the partner has no request
/// yet.
///
/// The token is a per-partner handle: when several requests exist, the most
/// recent one's token is surfaced. A freshly minted token belongs to a new
/// pending request without a sale order.
pub fn partner_token(conn: &Connection, partner_id: i64) -> Result<String> {
    if let Some(existing) = store::latest_request_for_partner(conn, partner_id)? {
        log::debug!(
            "Reusing token of request {} for partner {partner_id}",
            existing.id
        );
        return Ok(existing.external_token);
    }
    let request = store::insert_request(conn, partner_id, None)?;
    Ok(request.external_token)
}

/// Approves a pending request: creates invoice(s) from its sale order,
/// posts the first one, then records invoice, state and processing date in
/// one guarded update.
///
/// If invoice creation yields nothing, no state changes.
pub async fn approve_request(
    db: &Arc<Mutex<Connection>>,
    api: &OdooApi,
    request_id: i64,
) -> Result<ApproveOutcome> {
    let request = {
        let conn = db.lock().unwrap();
        store::request_by_id(&conn, request_id)?
    }
    .ok_or(RequestError::NotFound(request_id))?;

    if request.state != RequestState::Pending {
        log::info!("Invoice request {request_id} is not pending, leaving it untouched");
        return Ok(ApproveOutcome::Skipped {
            state: request.state,
        });
    }
    let Some(sale_id) = request.sale_id else {
        log::info!("Invoice request {request_id} has no sale order, leaving it untouched");
        return Ok(ApproveOutcome::Skipped {
            state: request.state,
        });
    };

    let invoice_ids = api.create_invoices_from_order(sale_id).await?;
    let Some(&invoice_id) = invoice_ids.first() else {
        log::warn!("Sale order {sale_id} produced no invoice, request {request_id} stays pending");
        return Ok(ApproveOutcome::Skipped {
            state: request.state,
        });
    };
    api.post_invoice(invoice_id).await?;

    let approved = {
        let conn = db.lock().unwrap();
        store::mark_approved(&conn, request_id, invoice_id, &store::now_timestamp())?
    };
    if !approved {
        // Lost a race with a concurrent approval; the other writer won.
        log::warn!("Invoice request {request_id} changed state mid-approval");
        return Ok(ApproveOutcome::Skipped {
            state: RequestState::Approved,
        });
    }

    log::info!("Approved invoice request {request_id} with invoice {invoice_id}");
    Ok(ApproveOutcome::Approved { invoice_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::init_schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn external_submission_starts_pending() {
        let conn = test_conn();
        let request = create_from_external_request(&conn, 7, 55).unwrap();
        assert_eq!(request.state, RequestState::Pending);
        assert_eq!(request.sale_id, Some(55));
        assert!(request.invoice_id.is_none());
        assert!(request.processing_date.is_none());
    }

    #[test]
    fn partner_token_is_stable() {
        let conn = test_conn();
        let first = partner_token(&conn, 7).unwrap();
        let second = partner_token(&conn, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn partner_token_mints_a_sale_less_pending_request() {
        let conn = test_conn();
        let token = partner_token(&conn, 7).unwrap();
        let request = store::request_by_token(&conn, &token).unwrap().unwrap();
        assert_eq!(request.partner_id, 7);
        assert_eq!(request.state, RequestState::Pending);
        assert!(request.sale_id.is_none());
    }

    #[test]
    fn partner_token_surfaces_most_recent_request() {
        let conn = test_conn();
        create_from_external_request(&conn, 7, 55).unwrap();
        let newer = create_from_external_request(&conn, 7, 56).unwrap();
        assert_eq!(partner_token(&conn, 7).unwrap(), newer.external_token);
    }
}
