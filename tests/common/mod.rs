// tests/common/mod.rs
//! Shared fixtures for the mock-server tests.

#![allow(dead_code)]

use feishu_docs::{ClientConfig, CredentialSecrets, DocumentSyncClient};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/auth/v3/tenant_access_token/internal";

pub fn test_secrets() -> CredentialSecrets {
    CredentialSecrets::new("cli_test_app", "test_secret").expect("Test secrets should be valid")
}

pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_base_url(server.uri())
}

pub fn session(server: &MockServer) -> DocumentSyncClient {
    DocumentSyncClient::from_secrets(test_config(server), test_secrets())
        .expect("Client should build")
}

/// A successful `{code: 0, msg, data}` envelope.
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "msg": "success", "data": data }))
}

/// A failed envelope with the given service code.
pub fn failed(code: i64, msg: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({ "code": code, "msg": msg }))
}

/// Mounts the credential exchange, answering with `token`.
pub async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "ok",
            "tenant_access_token": token,
            "expire": 7200
        })))
        .mount(server)
        .await;
}

/// Number of requests the server saw on `endpoint`.
pub async fn hits(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == endpoint)
        .count()
}

pub fn text_block(id: &str, content: &str) -> Value {
    json!({
        "block_id": id,
        "block_type": "text",
        "text": { "elements": [ { "text_run": { "content": content } } ] }
    })
}
