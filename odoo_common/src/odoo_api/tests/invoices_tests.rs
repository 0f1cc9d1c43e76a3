//! Tests for invoice creation, posting and PDF retrieval.

use base64::Engine;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::OdooConfig;
use crate::error::OdooError;
use crate::odoo_api::OdooApi;

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result
    }))
}

async fn connect(mock_server: &MockServer) -> OdooApi {
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("authenticate"))
        .respond_with(rpc_result(json!(2)))
        .mount(mock_server)
        .await;
    OdooApi::connect(OdooConfig::new(mock_server.uri(), "testdb", "admin", "secret"))
        .await
        .unwrap()
}

#[tokio::test]
async fn create_invoices_collects_ids() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("create_invoices"))
        .respond_with(rpc_result(json!([301])))
        .mount(&mock_server)
        .await;

    let ids = api.create_invoices_from_order(55).await.unwrap();
    assert_eq!(ids, vec![301]);
}

#[tokio::test]
async fn create_invoices_handles_single_id_result() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("create_invoices"))
        .respond_with(rpc_result(json!(301)))
        .mount(&mock_server)
        .await;

    let ids = api.create_invoices_from_order(55).await.unwrap();
    assert_eq!(ids, vec![301]);
}

#[tokio::test]
async fn create_invoices_yields_nothing_for_false_result() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("create_invoices"))
        .respond_with(rpc_result(json!(false)))
        .mount(&mock_server)
        .await;

    let ids = api.create_invoices_from_order(55).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn post_invoice_reports_success() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("action_post"))
        .respond_with(rpc_result(json!(true)))
        .mount(&mock_server)
        .await;

    assert!(api.post_invoice(301).await.unwrap());
}

#[tokio::test]
async fn invoice_by_id_returns_none_for_missing_id() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("account.move"))
        .respond_with(rpc_result(json!([])))
        .mount(&mock_server)
        .await;

    assert!(api.invoice_by_id(404).await.unwrap().is_none());
}

#[tokio::test]
async fn invoice_pdf_decodes_render_pair() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    let pdf = b"%PDF-1.4 fake";
    let encoded = base64::engine::general_purpose::STANDARD.encode(pdf);
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("render_qweb_pdf"))
        .respond_with(rpc_result(json!([encoded, "pdf"])))
        .mount(&mock_server)
        .await;

    let bytes = api.invoice_pdf(301).await.unwrap();
    assert_eq!(bytes, pdf);
}

#[tokio::test]
async fn invoice_pdf_decodes_bare_content_string() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4");
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("render_qweb_pdf"))
        .respond_with(rpc_result(json!(encoded)))
        .mount(&mock_server)
        .await;

    assert!(api.invoice_pdf(301).await.unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn invoice_pdf_rejects_malformed_payload() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("render_qweb_pdf"))
        .respond_with(rpc_result(json!({ "unexpected": true })))
        .mount(&mock_server)
        .await;

    assert!(matches!(
        api.invoice_pdf(301).await,
        Err(OdooError::Fault(_))
    ));
}
