//! Invoice creation, posting and PDF retrieval.

use base64::Engine;
use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::domain::Filter;
use crate::error::{OdooError, Result};
use crate::models::Invoice;

use super::OdooApi;

impl OdooApi {
    /// Creates draft invoices from a confirmed sale order, returning their
    /// ids.
    ///
    /// The object layer exposes the order's invoice-creation helper as
    /// `create_invoices`. An order with nothing left to invoice yields an
    /// empty list, not a fault.
    pub async fn create_invoices_from_order(&self, order_id: i64) -> Result<Vec<i64>> {
        info!("Creating invoices from sale.order {order_id}");
        let result = self
            .execute_kw("sale.order", "create_invoices", json!([[order_id]]), json!({}))
            .await?;

        let ids: Vec<i64> = match result {
            Value::Array(items) => items.iter().filter_map(Value::as_i64).collect(),
            Value::Number(n) => n.as_i64().into_iter().collect(),
            _ => Vec::new(),
        };

        if ids.is_empty() {
            warn!("sale.order {order_id} produced no invoices");
        } else {
            info!("sale.order {order_id} produced invoice(s) {ids:?}");
        }
        Ok(ids)
    }

    /// Posts a draft invoice; returns the remote success flag.
    pub async fn post_invoice(&self, invoice_id: i64) -> Result<bool> {
        info!("Posting account.move {invoice_id}");
        let result = self
            .execute_kw("account.move", "action_post", json!([[invoice_id]]), json!({}))
            .await?;
        Ok(!matches!(result, Value::Bool(false)))
    }

    /// Reads one invoice; `None` when the id does not exist.
    pub async fn invoice_by_id(&self, invoice_id: i64) -> Result<Option<Invoice>> {
        debug!("read account.move {invoice_id}");
        let filter = Filter::new().eq("id", invoice_id);
        let result = self
            .execute_kw(
                "account.move",
                "search_read",
                json!([filter.to_rpc()]),
                json!({ "fields": ["name", "state"], "limit": 1 }),
            )
            .await?;
        let Value::Array(rows) = result else {
            return Err(OdooError::Fault(format!(
                "unexpected invoice read result: {result}"
            )));
        };
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Renders an invoice to PDF through the report engine.
    ///
    /// The render call answers `[content, format]` with base64 content;
    /// some deployments return the content string directly.
    pub async fn invoice_pdf(&self, invoice_id: i64) -> Result<Vec<u8>> {
        info!("Rendering PDF for account.move {invoice_id}");
        let result = self
            .execute_kw(
                "ir.actions.report",
                "render_qweb_pdf",
                json!(["account.report_invoice", [invoice_id]]),
                json!({}),
            )
            .await?;

        let content = match &result {
            Value::Array(parts) => parts.first().and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
        .ok_or_else(|| {
            OdooError::Fault(format!(
                "unexpected report render result for invoice {invoice_id}"
            ))
        })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(content)
            .map_err(|e| OdooError::Fault(format!("report payload is not valid base64: {e}")))?;
        debug!("Rendered {} PDF byte(s) for invoice {invoice_id}", bytes.len());
        Ok(bytes)
    }
}
