use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use quill_types::{GenerateRequest, TransportError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::Duration;

use super::{FragmentStream, Transport};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/generate_email";

/// POSTs the instruction and streams the response body
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::builder().endpoint(endpoint).build()
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &GenerateRequest) -> Result<FragmentStream, TransportError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        tracing::debug!(endpoint = %self.endpoint, status = %status, "Stream opened");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Read(e.to_string())));

        Ok(Box::pin(body))
    }
}

/// Builder for HttpTransport
#[derive(Default)]
pub struct HttpTransportBuilder {
    endpoint: Option<String>,
    connect_timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Full URL of the generation route, e.g. "http://localhost:8000/generate_email"
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        reqwest::Url::parse(&endpoint)
            .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(HttpTransport {
            http_client,
            endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let transport = HttpTransport::builder().build().unwrap();
        assert_eq!(transport.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        assert!(HttpTransport::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_connection_refused_is_connection_error() {
        // Port 9 (discard) is not expected to accept HTTP connections locally
        let transport = HttpTransport::builder()
            .endpoint("http://127.0.0.1:9/generate_email")
            .connect_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let result = transport.open(&GenerateRequest::new("hi")).await;
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }
}
