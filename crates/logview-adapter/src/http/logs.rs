/*
[INPUT]:  Log window position (start, count)
[OUTPUT]: One page of raw log lines and the has_more flag
[POS]:    HTTP layer - log window endpoint
[UPDATE]: When the log window endpoint or its response format changes
*/

use reqwest::Method;
use tracing::debug;

use crate::http::{LogviewClient, Result};
use crate::types::{LogPage, LogWindowRequest};

impl LogviewClient {
    /// Fetch one window of log lines
    ///
    /// GET {endpoint}?start={start}&count={count}
    pub async fn fetch_window(&self, request: LogWindowRequest) -> Result<LogPage> {
        let builder = self.log_request(Method::GET)?.query(&request);
        let page: LogPage = self.send_json(builder).await?;
        debug!(
            start = request.start,
            count = request.count,
            lines = page.lines.len(),
            has_more = page.has_more,
            "fetched log window"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{LogviewClient, LogviewError};
    use crate::types::{LogPage, LogWindowRequest};
    use rstest::rstest;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_window() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "lines": ["\u001b[31mboot failed\u001b[0m", "retrying"],
            "has_more": true
        }"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/logs"))
            .and(query_param("start", "100"))
            .and(query_param("count", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(mock_response, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = LogviewClient::new(&server.uri()).expect("client init");
        let page = client
            .fetch_window(LogWindowRequest::new(100, 2))
            .await
            .expect("fetch_window failed");

        assert_eq!(
            page,
            LogPage {
                lines: vec![
                    "\u{1b}[31mboot failed\u{1b}[0m".to_string(),
                    "retrying".to_string(),
                ],
                has_more: true,
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_window_custom_endpoint() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/api/console"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lines": [],
                "has_more": false,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LogviewClient::new(&server.uri())
            .expect("client init")
            .with_endpoint("/api/console");
        let page = client
            .fetch_window(LogWindowRequest::new(0, 50))
            .await
            .expect("fetch_window failed");

        assert!(page.lines.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_error_field_fails_despite_ok_status() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "log file unavailable",
            })))
            .mount(&server)
            .await;

        let client = LogviewClient::new(&server.uri()).expect("client init");
        let err = client
            .fetch_window(LogWindowRequest::new(0, 10))
            .await
            .expect_err("error body must fail");

        match err {
            LogviewError::Api { code, message } => {
                assert_eq!(code, 200);
                assert_eq!(message, "log file unavailable");
            }
            other => panic!("Expected Api error variant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failing_status_without_error_field() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = LogviewClient::new(&server.uri()).expect("client init");
        let err = client
            .fetch_window(LogWindowRequest::new(0, 10))
            .await
            .expect_err("503 must fail");

        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "API error (code 503): maintenance");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_serialization_error() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let client = LogviewClient::new(&server.uri()).expect("client init");
        let err = client
            .fetch_window(LogWindowRequest::new(0, 10))
            .await
            .expect_err("html body must fail");

        assert!(matches!(err, LogviewError::Serialization(_)));
    }

    async fn fetch_with_body(body: serde_json::Value) -> Result<LogPage, LogviewError> {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = LogviewClient::new(&server.uri()).expect("client init");
        client.fetch_window(LogWindowRequest::new(0, 10)).await
    }

    #[rstest]
    #[case(serde_json::json!({ "error": null }), "log server reported an unspecified error")]
    #[case(serde_json::json!({ "error": { "reason": "rotated" } }), r#"{"reason":"rotated"}"#)]
    #[case(serde_json::json!({ "error": false, "lines": [], "has_more": false }), "false")]
    #[tokio::test]
    async fn test_error_key_fails_whatever_its_value(
        #[case] body: serde_json::Value,
        #[case] expected: &str,
    ) {
        let err = fetch_with_body(body).await.expect_err("error key must fail");
        match err {
            LogviewError::Api { code, message } => {
                assert_eq!(code, 200);
                assert_eq!(message, expected);
            }
            other => panic!("Expected Api error variant, got {other:?}"),
        }
    }

    #[rstest]
    #[case(serde_json::json!({}))]
    #[case(serde_json::json!({ "lines": ["a"] }))]
    #[case(serde_json::json!({ "has_more": true }))]
    #[case(serde_json::json!(["a", "b"]))]
    #[tokio::test]
    async fn test_body_without_page_shape_is_invalid(#[case] body: serde_json::Value) {
        let err = fetch_with_body(body).await.expect_err("shapeless body must fail");
        assert!(matches!(err, LogviewError::InvalidResponse(_)), "got {err:?}");
    }
}
