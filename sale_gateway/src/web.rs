//! REST endpoints for sale-order operations.
//!
//! Every route answers the uniform `{success, data|error}` envelope. Remote
//! faults surface as HTTP 400 with the fault text; 404 is reserved for a
//! single-resource read that finds nothing. Client-supplied filter and sort
//! expressions are validated before any remote call is made.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use odoo_common::odoo_api::{
    DEFAULT_ORDER_DETAIL_FIELDS, DEFAULT_ORDER_FIELDS, FILTERABLE_ORDER_FIELDS,
};
use odoo_common::{validate_order_clause, Filter, OdooApi, OdooError};

/// Shared application state (authenticated object-layer handle)
#[derive(Clone)]
struct AppState {
    api: Arc<OdooApi>,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn ok_with<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
        .into_response()
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

/// Maps an object-layer failure onto the envelope.
fn remote_error(error: OdooError) -> Response {
    log::error!("Remote call failed: {error}");
    fail(StatusCode::BAD_REQUEST, error.to_string())
}

/// Listing query parameters
#[derive(Deserialize)]
struct ListParams {
    domain: Option<String>,
    fields: Option<String>,
    #[serde(default)]
    offset: u32,
    limit: Option<u32>,
    order: Option<String>,
}

/// Single-read query parameters
#[derive(Deserialize)]
struct DetailParams {
    fields: Option<String>,
}

/// Splits a comma-separated field selection, falling back to `default`.
fn selected_fields(raw: Option<&str>, default: &[&str]) -> Vec<String> {
    match raw {
        Some(list) if !list.trim().is_empty() => list
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        _ => default.iter().map(|f| f.to_string()).collect(),
    }
}

/// GET /api/sale-orders
async fn list_orders(State(state): State<AppState>, Query(params): Query<ListParams>) -> Response {
    let filter = match params.domain.as_deref() {
        None => Filter::new(),
        Some(raw) => match Filter::parse(raw, FILTERABLE_ORDER_FIELDS) {
            Ok(filter) => filter,
            Err(e) => {
                log::warn!("Rejected filter expression: {e}");
                return fail(StatusCode::BAD_REQUEST, e.to_string());
            }
        },
    };
    let order = match params.order.as_deref() {
        None => None,
        Some(raw) => match validate_order_clause(raw, FILTERABLE_ORDER_FIELDS) {
            Ok(clause) => Some(clause),
            Err(e) => {
                log::warn!("Rejected sort clause: {e}");
                return fail(StatusCode::BAD_REQUEST, e.to_string());
            }
        },
    };
    let fields = selected_fields(params.fields.as_deref(), DEFAULT_ORDER_FIELDS);

    match state
        .api
        .search_read_sale_orders(&filter, &fields, params.offset, params.limit, order.as_deref())
        .await
    {
        Ok(rows) => ok_with(StatusCode::OK, rows),
        Err(e) => remote_error(e),
    }
}

/// GET /api/sale-orders/{id}
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Query(params): Query<DetailParams>,
) -> Response {
    let fields = selected_fields(params.fields.as_deref(), DEFAULT_ORDER_DETAIL_FIELDS);
    match state.api.read_sale_order(order_id, &fields).await {
        // `data` is a one-element list, the object layer's read shape
        Ok(Some(row)) => ok_with(StatusCode::OK, json!([row])),
        Ok(None) => fail(StatusCode::NOT_FOUND, "Order not found"),
        Err(e) => remote_error(e),
    }
}

/// Parses a request body into a non-empty JSON object payload.
fn require_payload(body: &Bytes) -> Result<Value, &'static str> {
    if body.is_empty() {
        return Err("No data provided");
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| "Invalid JSON payload")?;
    match value.as_object() {
        Some(map) if !map.is_empty() => Ok(value),
        _ => Err("No data provided"),
    }
}

/// POST /api/sale-orders
async fn create_order(State(state): State<AppState>, body: Bytes) -> Response {
    let values = match require_payload(&body) {
        Ok(values) => values,
        Err(message) => return fail(StatusCode::BAD_REQUEST, message),
    };
    match state.api.create_sale_order(&values).await {
        Ok(id) => ok_with(StatusCode::CREATED, json!({ "id": id })),
        Err(e) => remote_error(e),
    }
}

/// PUT /api/sale-orders/{id}
async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    body: Bytes,
) -> Response {
    let values = match require_payload(&body) {
        Ok(values) => values,
        Err(message) => return fail(StatusCode::BAD_REQUEST, message),
    };
    match state.api.update_sale_order(order_id, &values).await {
        Ok(updated) => ok_with(StatusCode::OK, json!({ "updated": updated })),
        Err(e) => remote_error(e),
    }
}

/// POST /api/sale-orders/{id}/confirm
async fn confirm_order(State(state): State<AppState>, Path(order_id): Path<i64>) -> Response {
    match state.api.confirm_sale_order(order_id).await {
        Ok(confirmed) => ok_with(StatusCode::OK, json!({ "confirmed": confirmed })),
        Err(e) => remote_error(e),
    }
}

/// POST /api/sale-orders/{id}/cancel
async fn cancel_order(State(state): State<AppState>, Path(order_id): Path<i64>) -> Response {
    match state.api.cancel_sale_order(order_id).await {
        Ok(cancelled) => ok_with(StatusCode::OK, json!({ "cancelled": cancelled })),
        Err(e) => remote_error(e),
    }
}

/// POST /api/sale-orders/{id}/draft
async fn draft_order(State(state): State<AppState>, Path(order_id): Path<i64>) -> Response {
    match state.api.reset_sale_order_to_draft(order_id).await {
        Ok(reset) => ok_with(StatusCode::OK, json!({ "reset_to_draft": reset })),
        Err(e) => remote_error(e),
    }
}

/// Build the gateway router
pub fn create_router(api: Arc<OdooApi>) -> Router {
    let state = AppState { api };

    Router::new()
        .route("/api/sale-orders", get(list_orders).post(create_order))
        .route("/api/sale-orders/{id}", get(get_order).put(update_order))
        .route("/api/sale-orders/{id}/confirm", post(confirm_order))
        .route("/api/sale-orders/{id}/cancel", post(cancel_order))
        .route("/api/sale-orders/{id}/draft", post(draft_order))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway server (async)
pub async fn serve(api: OdooApi, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(Arc::new(api));
    let addr = format!("0.0.0.0:{port}");

    log::info!("Sale-order gateway listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_serialization() {
        let response: ApiResponse<Vec<i64>> = ApiResponse {
            success: true,
            data: Some(vec![1, 2, 3]),
            error: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\":[1,2,3]"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn api_response_error_serialization() {
        let response: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            error: Some("Order not found".to_string()),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"Order not found\""));
        assert!(!json.contains("\"data\""));
    }

    #[test]
    fn selected_fields_fall_back_to_default() {
        let fields = selected_fields(None, DEFAULT_ORDER_FIELDS);
        assert_eq!(fields.len(), DEFAULT_ORDER_FIELDS.len());
        assert_eq!(fields[0], "name");

        let fields = selected_fields(Some("   "), DEFAULT_ORDER_FIELDS);
        assert_eq!(fields.len(), DEFAULT_ORDER_FIELDS.len());
    }

    #[test]
    fn selected_fields_split_and_trim() {
        let fields = selected_fields(Some("name, state ,amount_total"), DEFAULT_ORDER_FIELDS);
        assert_eq!(fields, vec!["name", "state", "amount_total"]);
    }

    #[test]
    fn payload_rules_reject_empty_bodies() {
        assert!(require_payload(&Bytes::new()).is_err());
        assert!(require_payload(&Bytes::from_static(b"{}")).is_err());
        assert!(require_payload(&Bytes::from_static(b"[1, 2]")).is_err());
        assert!(require_payload(&Bytes::from_static(b"not json")).is_err());
        assert!(require_payload(&Bytes::from_static(b"{\"partner_id\": 7}")).is_ok());
    }
}
