//! Sale-order operations.

use std::collections::HashMap;

use log::{debug, info};
use serde_json::{json, Map, Value};

use crate::domain::Filter;
use crate::error::{OdooError, Result};
use crate::models::SaleOrder;

use super::OdooApi;

/// Field selection used by the listing endpoint when the caller does not
/// ask for specific fields.
pub const DEFAULT_ORDER_FIELDS: &[&str] =
    &["name", "partner_id", "date_order", "amount_total", "state"];

/// Field selection for single-order reads; includes the order lines.
pub const DEFAULT_ORDER_DETAIL_FIELDS: &[&str] = &[
    "name",
    "partner_id",
    "date_order",
    "amount_total",
    "state",
    "order_line",
];

/// Fields accepted in client-supplied filter and sort clauses.
pub const FILTERABLE_ORDER_FIELDS: &[&str] = &[
    "id",
    "name",
    "partner_id",
    "date_order",
    "amount_total",
    "state",
    "invoice_status",
    "currency_id",
];

/// Canonical fields for typed sale-order reads.
const TYPED_ORDER_FIELDS: &[&str] = &[
    "name",
    "partner_id",
    "date_order",
    "amount_total",
    "state",
    "invoice_status",
    "currency_id",
    "order_line",
];

impl OdooApi {
    /// Lists sale orders matching `filter`, returning raw field maps in the
    /// caller's field selection.
    pub async fn search_read_sale_orders(
        &self,
        filter: &Filter,
        fields: &[String],
        offset: u32,
        limit: Option<u32>,
        order: Option<&str>,
    ) -> Result<Vec<Value>> {
        debug!(
            "search_read sale.order: {} condition(s), offset {offset}, limit {limit:?}",
            filter.len()
        );

        let mut kwargs = Map::new();
        kwargs.insert("fields".into(), json!(fields));
        kwargs.insert("offset".into(), json!(offset));
        if let Some(limit) = limit {
            kwargs.insert("limit".into(), json!(limit));
        }
        if let Some(order) = order {
            kwargs.insert("order".into(), json!(order));
        }

        let result = self
            .execute_kw(
                "sale.order",
                "search_read",
                json!([filter.to_rpc()]),
                Value::Object(kwargs),
            )
            .await?;
        match result {
            Value::Array(rows) => {
                debug!("search_read returned {} row(s)", rows.len());
                Ok(rows)
            }
            other => Err(OdooError::Fault(format!(
                "unexpected search_read result: {other}"
            ))),
        }
    }

    /// Reads one sale order; `None` when the id does not exist.
    pub async fn read_sale_order(&self, order_id: i64, fields: &[String]) -> Result<Option<Value>> {
        let filter = Filter::new().eq("id", order_id);
        let rows = self
            .search_read_sale_orders(&filter, fields, 0, Some(1), None)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Typed single-order read used by the invoice-request flows.
    pub async fn sale_order_by_id(&self, order_id: i64) -> Result<Option<SaleOrder>> {
        let fields: Vec<String> = TYPED_ORDER_FIELDS.iter().map(|f| f.to_string()).collect();
        match self.read_sale_order(order_id, &fields).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Orders eligible for an invoice request: confirmed and still to
    /// invoice, optionally scoped to one partner.
    pub async fn eligible_sale_orders(&self, partner_id: Option<i64>) -> Result<Vec<SaleOrder>> {
        let mut filter = Filter::new()
            .eq("state", "sale")
            .eq("invoice_status", "to invoice");
        if let Some(partner_id) = partner_id {
            filter = filter.eq("partner_id", partner_id);
        }

        let fields: Vec<String> = TYPED_ORDER_FIELDS.iter().map(|f| f.to_string()).collect();
        let rows = self
            .search_read_sale_orders(&filter, &fields, 0, None, None)
            .await?;
        let orders: Vec<SaleOrder> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()?;
        info!(
            "{} eligible sale order(s){}",
            orders.len(),
            partner_id
                .map(|id| format!(" for partner {id}"))
                .unwrap_or_default()
        );
        Ok(orders)
    }

    /// Creates a sale order and returns its id.
    pub async fn create_sale_order(&self, values: &Value) -> Result<i64> {
        let result = self
            .execute_kw("sale.order", "create", json!([values]), json!({}))
            .await?;
        let id = result.as_i64().ok_or_else(|| {
            OdooError::Fault(format!("unexpected create result: {result}"))
        })?;
        info!("Created sale.order {id}");
        Ok(id)
    }

    /// Writes `values` on an existing order; returns the remote success flag.
    pub async fn update_sale_order(&self, order_id: i64, values: &Value) -> Result<bool> {
        let result = self
            .execute_kw("sale.order", "write", json!([[order_id], values]), json!({}))
            .await?;
        info!("Updated sale.order {order_id}");
        Ok(result.as_bool().unwrap_or(false))
    }

    /// Confirms a quotation, moving it to state `sale`.
    pub async fn confirm_sale_order(&self, order_id: i64) -> Result<bool> {
        self.invoke_order_action(order_id, "action_confirm").await
    }

    /// Cancels a sale order.
    pub async fn cancel_sale_order(&self, order_id: i64) -> Result<bool> {
        self.invoke_order_action(order_id, "action_cancel").await
    }

    /// Resets a sale order to draft.
    pub async fn reset_sale_order_to_draft(&self, order_id: i64) -> Result<bool> {
        self.invoke_order_action(order_id, "action_draft").await
    }

    async fn invoke_order_action(&self, order_id: i64, action: &str) -> Result<bool> {
        info!("Invoking {action} on sale.order {order_id}");
        let result = self
            .execute_kw("sale.order", action, json!([[order_id]]), json!({}))
            .await?;
        // Workflow actions answer `true` or an action descriptor; only an
        // explicit `false` counts as a refusal.
        Ok(!matches!(result, Value::Bool(false)))
    }

    /// Resolves display symbols for the given `res.currency` ids.
    pub async fn currency_symbols(&self, ids: &[i64]) -> Result<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        debug!("read res.currency symbols for {} id(s)", ids.len());
        let result = self
            .execute_kw(
                "res.currency",
                "read",
                json!([ids]),
                json!({ "fields": ["symbol"] }),
            )
            .await?;
        let Value::Array(rows) = result else {
            return Err(OdooError::Fault(format!(
                "unexpected currency read result: {result}"
            )));
        };

        let mut symbols = HashMap::new();
        for row in rows {
            if let Some(id) = row.get("id").and_then(Value::as_i64) {
                let symbol = row
                    .get("symbol")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                symbols.insert(id, symbol);
            }
        }
        Ok(symbols)
    }
}
