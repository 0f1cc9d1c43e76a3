//! Tests for partner reads.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::OdooConfig;
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
async fn partner_by_id_parses_falsy_contact_fields() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("res.partner"))
        .respond_with(rpc_result(json!([{
            "id": 12,
            "name": "Deco Addict",
            "email": "deco.addict82@example.com",
            "phone": false
        }])))
        .mount(&mock_server)
        .await;

    let partner = api.partner_by_id(12).await.unwrap().unwrap();
    assert_eq!(partner.name, "Deco Addict");
    assert_eq!(partner.email.as_deref(), Some("deco.addict82@example.com"));
    assert!(partner.phone.is_none());
}

#[tokio::test]
async fn partner_by_id_returns_none_for_missing_id() {
    let mock_server = MockServer::start().await;
    let api = connect(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_string_contains("res.partner"))
        .respond_with(rpc_result(json!([])))
        .mount(&mock_server)
        .await;

    let partner = api.partner_by_id(404).await.unwrap();
    assert!(partner.is_none());
}
