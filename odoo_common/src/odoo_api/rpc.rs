//! JSON-RPC plumbing shared by all operations.

use log::{debug, error};
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::OdooConfig;
use crate::error::{OdooError, Result};

use super::OdooApi;

/// Reduces a JSON-RPC error member to its human-readable message.
///
/// The object layer nests the business message under `data.message`; the
/// top-level `message` is a generic marker kept as a fallback.
fn fault_message(fault: &Value) -> String {
    fault
        .pointer("/data/message")
        .and_then(Value::as_str)
        .or_else(|| fault.get("message").and_then(Value::as_str))
        .unwrap_or("unknown object-layer fault")
        .to_string()
}

pub(crate) async fn call_service(
    client: &Client,
    url: &str,
    service: &str,
    method: &str,
    args: Value,
) -> Result<Value> {
    let endpoint = format!("{}/jsonrpc", url.trim_end_matches('/'));
    debug!("JSON-RPC call: {service}.{method}");

    let body = json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": {
            "service": service,
            "method": method,
            "args": args,
        },
        "id": 1,
    });

    let response = client.post(&endpoint).json(&body).send().await?;
    debug!("JSON-RPC response status: {}", response.status());

    if !response.status().is_success() {
        error!(
            "JSON-RPC endpoint returned HTTP {} for {service}.{method}",
            response.status()
        );
        return Err(OdooError::HttpStatus(response.status()));
    }

    let envelope: Value = response.json().await?;
    if let Some(fault) = envelope.get("error") {
        let message = fault_message(fault);
        error!("Object-layer fault in {service}.{method}: {message}");
        return Err(OdooError::Fault(message));
    }

    Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
}

/// Authenticates and returns the user id.
///
/// The object layer signals rejected credentials with a `false` result
/// rather than a fault.
pub(crate) async fn authenticate(client: &Client, config: &OdooConfig) -> Result<i64> {
    let result = call_service(
        client,
        &config.url,
        "common",
        "authenticate",
        json!([config.db, config.username, config.password, {}]),
    )
    .await?;

    match result.as_i64() {
        Some(uid) if uid > 0 => Ok(uid),
        _ => Err(OdooError::AuthenticationFailed(config.db.clone())),
    }
}

impl OdooApi {
    /// Invokes `method` on `model` through `execute_kw`.
    pub(crate) async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value> {
        call_service(
            &self.client,
            &self.config.url,
            "object",
            "execute_kw",
            json!([
                self.config.db,
                self.uid,
                self.config.password,
                model,
                method,
                args,
                kwargs,
            ]),
        )
        .await
    }
}
