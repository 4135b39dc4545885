//! Sending serialized queries to the Cayley endpoint.

use reqwest::blocking::Client;

use crate::error::TransportError;
use crate::settings::Settings;

/// Status and body of one endpoint reply, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// One blocking request/response exchange per call.
///
/// Implementations must not retry: a chain executes at most once and reports
/// whatever the single attempt produced.
pub trait Transport: Send + Sync {
    fn submit(&self, query: &str) -> Result<RawResponse, TransportError>;
}

/// `POST <query_url>` with the query text as the UTF-8 body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::unreachable(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            url: settings.query_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn submit(&self, query: &str) -> Result<RawResponse, TransportError> {
        let resp = self
            .client
            .post(&self.url)
            .body(query.as_bytes().to_vec())
            .send()
            .map_err(|e| {
                TransportError::unreachable(format!("failed to reach cayley at {} ({e})", self.url))
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| TransportError {
            status: Some(status),
            message: Some(format!("failed to read response body: {e}")),
        })?;
        Ok(RawResponse { status, body })
    }
}
