//! Partner (customer) reads.

use log::debug;
use serde_json::{json, Value};

use crate::domain::Filter;
use crate::error::{OdooError, Result};
use crate::models::Partner;

use super::OdooApi;

impl OdooApi {
    /// Reads one partner; `None` when the id does not exist.
    pub async fn partner_by_id(&self, partner_id: i64) -> Result<Option<Partner>> {
        debug!("read res.partner {partner_id}");
        let filter = Filter::new().eq("id", partner_id);
        let result = self
            .execute_kw(
                "res.partner",
                "search_read",
                json!([filter.to_rpc()]),
                json!({ "fields": ["name", "email", "phone"], "limit": 1 }),
            )
            .await?;
        let Value::Array(rows) = result else {
            return Err(OdooError::Fault(format!(
                "unexpected partner read result: {result}"
            )));
        };
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }
}
