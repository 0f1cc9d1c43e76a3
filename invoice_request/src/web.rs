//! Public web endpoints for external invoice requests.
//!
//! Three public surfaces: the to-invoice listing page, the external request
//! form (resumable by token) and the JSON submission endpoint, plus the PDF
//! download and a small admin surface for approving requests. Submission
//! errors are payload-coded; the submit route answers 200 at the transport
//! level.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use odoo_common::models::id_or_false;
use odoo_common::{OdooApi, SaleOrder};

use crate::lifecycle::{self, ApproveOutcome};
use crate::model::{InvoiceRequest, RequestState};
use crate::store;

const FORM_PAGE: &str = include_str!("../static/form.html");
const ORDERS_PAGE: &str = include_str!("../static/orders.html");
const NOT_FOUND_PAGE: &str = include_str!("../static/not_found.html");

/// Shared application state (request store + object-layer handle)
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    api: Arc<OdooApi>,
}

/// API response wrapper for the admin surface
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Injects the page payload into the `__PAGE_DATA__` slot of a template.
///
/// `<` is escaped so the payload can't close the surrounding script tag.
fn render_page(template: &'static str, data: &Value) -> Html<String> {
    let payload = data.to_string().replace('<', "\\u003c");
    Html(template.replace("__PAGE_DATA__", &payload))
}

fn not_found_page() -> Response {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
}

fn falsy_id(id: Option<i64>) -> Value {
    match id {
        Some(id) => json!(id),
        None => json!(false),
    }
}

fn falsy_str(value: &Option<String>) -> Value {
    match value {
        Some(s) => json!(s),
        None => json!(false),
    }
}

/// Shapes one eligible order for the embedded page payloads.
fn sale_row(order: &SaleOrder) -> Value {
    json!({
        "id": order.id,
        "name": order.name,
        "date_order": falsy_str(&order.date_order),
        "amount_total": order.amount_total,
        "partner": {
            "id": falsy_id(order.partner_id.as_ref().map(|p| p.id)),
            "name": order.partner_id.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
        },
    })
}

/// GET /sale-orders/to-invoice
///
/// Lists every confirmed order that still has something to invoice.
async fn list_to_invoice_orders(State(state): State<AppState>) -> Response {
    let orders = match state.api.eligible_sale_orders(None).await {
        Ok(orders) => orders,
        Err(e) => {
            log::error!("Failed to list to-invoice orders: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let currency_ids: Vec<i64> = orders
        .iter()
        .filter_map(|o| o.currency_id.as_ref().map(|c| c.id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let symbols = match state.api.currency_symbols(&currency_ids).await {
        Ok(symbols) => symbols,
        Err(e) => {
            log::error!("Failed to resolve currency symbols: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let rows: Vec<Value> = orders
        .iter()
        .map(|order| {
            let currency = order
                .currency_id
                .as_ref()
                .and_then(|c| symbols.get(&c.id))
                .cloned()
                .unwrap_or_default();
            json!({
                "id": order.id,
                "name": order.name,
                "partner_id": falsy_id(order.partner_id.as_ref().map(|p| p.id)),
                "partner_name": order.partner_id.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
                "date_order": falsy_str(&order.date_order),
                "amount_total": order.amount_total,
                "currency": currency,
                "order_line_count": order.order_line.len(),
            })
        })
        .collect();

    render_page(ORDERS_PAGE, &json!({ "orders": rows })).into_response()
}

/// Form query parameters
#[derive(Deserialize)]
struct FormParams {
    sale_id: Option<i64>,
    partner_id: Option<i64>,
}

async fn form_without_token(
    State(state): State<AppState>,
    Query(params): Query<FormParams>,
) -> Response {
    form_page(state, None, params).await
}

async fn form_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(params): Query<FormParams>,
) -> Response {
    form_page(state, Some(token), params).await
}

/// GET /external/sale-invoice and /external/sale-invoice/{token}
///
/// Resolves the partner by token first, raw partner id second, and renders
/// the request form with its embedded JSON payload.
async fn form_page(state: AppState, token: Option<String>, params: FormParams) -> Response {
    let token = token.filter(|t| !t.is_empty());

    // A token wins over a raw partner id; an unknown token resolves nothing.
    let invoice_request = match token.as_deref() {
        Some(token) => {
            let conn = state.db.lock().unwrap();
            match store::request_by_token(&conn, token) {
                Ok(request) => request,
                Err(e) => {
                    log::error!("Token lookup failed: {e}");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        }
        None => None,
    };
    let partner_id = match (&token, &invoice_request) {
        (Some(_), Some(request)) => Some(request.partner_id),
        (Some(_), None) => None,
        (None, _) => params.partner_id,
    };

    let partner = match partner_id {
        Some(id) => match state.api.partner_by_id(id).await {
            Ok(partner) => partner,
            Err(e) => {
                log::error!("Partner lookup failed: {e}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        None => None,
    };

    let sales = match state
        .api
        .eligible_sale_orders(partner.as_ref().map(|p| p.id))
        .await
    {
        Ok(sales) => sales,
        Err(e) => {
            log::error!("Failed to list eligible orders: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let data = json!({
        "token": token.unwrap_or_default(),
        "partner": {
            "id": falsy_id(partner.as_ref().map(|p| p.id)),
            "name": partner.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
            "email": partner.as_ref().and_then(|p| p.email.clone()).unwrap_or_default(),
            "phone": partner.as_ref().and_then(|p| p.phone.clone()).unwrap_or_default(),
        },
        "sales": sales.iter().map(sale_row).collect::<Vec<_>>(),
        "has_partner": partner.is_some(),
        "preselected_sale_id": falsy_id(params.sale_id),
        "invoice": {
            "id": falsy_id(invoice_request.as_ref().and_then(|r| r.invoice_id)),
            "state": invoice_request.as_ref().map(|r| r.state.to_string()).unwrap_or_default(),
        },
    });

    render_page(FORM_PAGE, &data).into_response()
}

/// Submission payload; ids arrive as numbers or numeric strings from the
/// form's select elements.
#[derive(Deserialize)]
struct SubmitPayload {
    #[serde(default)]
    token: String,
    #[serde(deserialize_with = "flexible_id")]
    partner_id: i64,
    #[serde(deserialize_with = "flexible_id")]
    sale_id: i64,
}

fn flexible_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n.as_i64().ok_or_else(|| D::Error::custom("id must be an integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom("id must be an integer")),
        _ => Err(D::Error::custom("id must be an integer")),
    }
}

/// Submission result; a missing invoice id serializes as `false`.
#[derive(Serialize)]
struct SubmitResponse {
    success: bool,
    message: String,
    #[serde(serialize_with = "id_or_false")]
    invoice_id: Option<i64>,
    state: RequestState,
    token: String,
}

/// POST /external/sale-invoice/submit
///
/// Errors are payload-coded (`{"error": ...}`); the transport status stays
/// 200 so the form widget can handle every outcome uniformly.
async fn submit_invoice_request(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: SubmitPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Rejected submission payload: {e}");
            return Json(json!({ "error": "Invalid request" })).into_response();
        }
    };

    let partner = match state.api.partner_by_id(payload.partner_id).await {
        Ok(Some(partner)) => partner,
        Ok(None) => return Json(json!({ "error": "Invalid partner" })).into_response(),
        Err(e) => {
            log::error!("Partner lookup failed: {e}");
            return Json(json!({ "error": e.to_string() })).into_response();
        }
    };

    // Re-validate the order before touching the store: a stale form may
    // race with concurrent invoicing, and a rejected submission must not
    // leave a record behind
    let eligible = match state.api.sale_order_by_id(payload.sale_id).await {
        Ok(Some(order)) => order.is_invoiceable(),
        Ok(None) => false,
        Err(e) => {
            log::error!("Sale order lookup failed: {e}");
            return Json(json!({ "error": e.to_string() })).into_response();
        }
    };
    if !eligible {
        return Json(json!({ "error": "Invalid sales order" })).into_response();
    }

    // Mint a token when the client has none yet
    let token = if payload.token.is_empty() {
        let minted = {
            let conn = state.db.lock().unwrap();
            lifecycle::partner_token(&conn, partner.id)
        };
        match minted {
            Ok(token) => token,
            Err(e) => {
                log::error!("Token creation failed: {e}");
                return Json(json!({ "error": e.to_string() })).into_response();
            }
        }
    } else {
        payload.token.clone()
    };

    let request = {
        let conn = state.db.lock().unwrap();
        lifecycle::create_from_external_request(&conn, partner.id, payload.sale_id)
    };
    match request {
        Ok(request) => Json(SubmitResponse {
            success: true,
            message: "Invoice request submitted successfully".to_string(),
            invoice_id: request.invoice_id,
            state: request.state,
            token,
        })
        .into_response(),
        Err(e) => {
            log::error!("Failed to record invoice request: {e}");
            Json(json!({ "error": e.to_string() })).into_response()
        }
    }
}

/// GET /external/sale-invoice/download/{invoice_id}
///
/// Streams the rendered invoice PDF. Only invoices that exist and that some
/// invoice request references are downloadable.
async fn download_invoice(State(state): State<AppState>, Path(invoice_id): Path<i64>) -> Response {
    let referenced = {
        let conn = state.db.lock().unwrap();
        match store::request_referencing_invoice(&conn, invoice_id) {
            Ok(request) => request.is_some(),
            Err(e) => {
                log::error!("Invoice reference lookup failed: {e}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    };
    if !referenced {
        log::warn!("Refused download of unreferenced invoice {invoice_id}");
        return not_found_page();
    }

    let invoice = match state.api.invoice_by_id(invoice_id).await {
        Ok(Some(invoice)) => invoice,
        Ok(None) => return not_found_page(),
        Err(e) => {
            log::error!("Invoice lookup failed: {e}");
            return not_found_page();
        }
    };

    match state.api.invoice_pdf(invoice_id).await {
        Ok(bytes) => {
            let name = if invoice.name.is_empty() {
                format!("invoice_{invoice_id}")
            } else {
                invoice.name.replace(['/', '\\', '"'], "_")
            };
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/pdf")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{name}.pdf\""),
                )
                .body(Body::from(bytes))
                .unwrap()
        }
        Err(e) => {
            log::error!("PDF rendering failed for invoice {invoice_id}: {e}");
            not_found_page()
        }
    }
}

/// GET /requests - admin listing, most recent first
async fn list_requests_handler(State(state): State<AppState>) -> Response {
    let requests = {
        let conn = state.db.lock().unwrap();
        store::list_requests(&conn)
    };
    match requests {
        Ok(data) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to list invoice requests: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Vec<InvoiceRequest>> {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// POST /requests/{id}/approve
async fn approve_request_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match lifecycle::approve_request(&state.db, &state.api, id).await {
        Ok(ApproveOutcome::Approved { invoice_id }) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(json!({ "state": RequestState::Approved, "invoice_id": invoice_id })),
                error: None,
            }),
        )
            .into_response(),
        Ok(ApproveOutcome::Skipped { state }) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(json!({ "state": state })),
                error: None,
            }),
        )
            .into_response(),
        Err(crate::error::RequestError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Value> {
                success: false,
                data: None,
                error: Some("Request not found".to_string()),
            }),
        )
            .into_response(),
        Err(e) => {
            log::error!("Approval of request {id} failed: {e}");
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Value> {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Build the service router
pub fn create_router(db: Arc<Mutex<Connection>>, api: Arc<OdooApi>) -> Router {
    let state = AppState { db, api };

    Router::new()
        .route("/sale-orders/to-invoice", get(list_to_invoice_orders))
        .route("/external/sale-invoice", get(form_without_token))
        .route("/external/sale-invoice/{token}", get(form_with_token))
        .route("/external/sale-invoice/submit", post(submit_invoice_request))
        .route(
            "/external/sale-invoice/download/{invoice_id}",
            get(download_invoice),
        )
        .route("/requests", get(list_requests_handler))
        .route("/requests/{id}/approve", post(approve_request_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server (async)
pub async fn serve(
    db: Arc<Mutex<Connection>>,
    api: Arc<OdooApi>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(db, api);
    let addr = format!("0.0.0.0:{port}");

    log::info!("Invoice-request service listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
