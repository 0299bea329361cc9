/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for logview-adapter tests

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Numbered sample lines in the shape the radio log producer emits
pub fn sample_lines(start: u64, count: u64) -> Vec<String> {
    (start..start + count)
        .map(|n| format!("\u{1b}[38;2;0;255;0m [radio] line {n} \u{1b}[0m"))
        .collect()
}

/// Mount a page for one `(start, count)` window
pub async fn mount_page(server: &MockServer, start: u64, count: u32, lines: Vec<String>, has_more: bool) {
    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param("start", start.to_string()))
        .and(query_param("count", count.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lines": lines,
            "has_more": has_more,
        })))
        .mount(server)
        .await;
}
