//! Mock secure data store built on wiremock

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve `bytes` (base64-encoded) as `file_name` for `identifier`
pub async fn mount_document(server: &MockServer, identifier: &str, file_name: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/api/files/{identifier}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fileName": file_name,
            "content": STANDARD.encode(bytes),
        })))
        .mount(server)
        .await;
}

/// Answer `status` with an empty body for `identifier`
pub async fn mount_status(server: &MockServer, identifier: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/api/files/{identifier}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of fetches the mock store has seen
pub async fn fetch_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
