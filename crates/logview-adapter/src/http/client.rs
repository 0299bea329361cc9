/*
[INPUT]:  HTTP configuration (base URL, endpoint, timeouts)
[OUTPUT]: Configured reqwest client ready for log window requests
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::http::{LogviewError, Result};
use crate::types::ErrorResponse;

/// Default path of the log window endpoint
pub const DEFAULT_LOG_ENDPOINT: &str = "/logs";

/// Longest slice of a failing body carried into an error message
const ERROR_BODY_PREVIEW: usize = 256;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for a remote log server
#[derive(Debug, Clone)]
pub struct LogviewClient {
    http_client: Client,
    base_url: Url,
    endpoint: String,
    timeout: Duration,
}

impl LogviewClient {
    /// Create a new client with default configuration
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::default(), base_url)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(LogviewError::Config(format!(
                "base url cannot carry a path: {base_url}"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            endpoint: DEFAULT_LOG_ENDPOINT.to_string(),
            timeout: config.timeout,
        })
    }

    /// Override the log window endpoint path (default `/logs`)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build full URL for an endpoint
    fn url(&self, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(endpoint)
    }

    /// Build request builder for the configured log endpoint
    pub(crate) fn log_request(&self, method: Method) -> Result<RequestBuilder> {
        let url = self.url(&self.endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and decode its JSON body.
    ///
    /// A body carrying an `error` key is a failure whatever the status or
    /// the key's value; a failing status without one is reported with a
    /// body preview; a JSON body without the expected shape is invalid.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(|err| self.map_transport(err))?;
        let status = response.status();
        let body = response.text().await.map_err(|err| self.map_transport(err))?;
        debug!(status = status.as_u16(), bytes = body.len(), "log server responded");

        let decoded = serde_json::from_str::<Value>(&body);
        if let Some(failure) = decoded.as_ref().ok().and_then(ErrorResponse::from_body) {
            return Err(LogviewError::api_error(status, failure.message()));
        }

        if !status.is_success() {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            let message = if preview.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                preview
            };
            return Err(LogviewError::api_error(status, message));
        }

        serde_json::from_value(decoded?)
            .map_err(|err| LogviewError::InvalidResponse(format!("unexpected body shape: {err}")))
    }

    fn map_transport(&self, err: reqwest::Error) -> LogviewError {
        if err.is_timeout() {
            LogviewError::Timeout {
                duration: self.timeout.as_secs(),
            }
        } else {
            LogviewError::Http(err)
        }
    }
}
