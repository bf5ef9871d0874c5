//! HTTP transport abstraction.
//!
//! The dispatch engine only ever sees these traits; the reqwest-backed
//! implementation lives here too, and tests substitute stubs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

/// Response data recorded for a completed request.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: String,
    pub elapsed: Duration,
}

/// Errors surfaced by a transport context.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Transient connection-overflow signal; the engine pauses once and
    /// retries the request on the same context.
    #[error("the server connection pool is busy: {0}")]
    Busy(String),

    #[error("error while sending http request: {0}")]
    Other(String),
}

/// One shared connection context able to execute GetMap requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

/// Source of fresh transport contexts, consulted by the engine at each
/// connection-renewal threshold.
pub trait TransportFactory: Send + Sync {
    fn new_context(&self) -> anyhow::Result<Arc<dyn Transport>>;
}

/// `reqwest`-backed transport. One client per context; dropping the last
/// handle releases the underlying connection pool.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        // Benchmark targets are often staging deployments with self-signed
        // certificates.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let start = Instant::now();
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Drain the body so the elapsed time covers the full transfer.
        let _ = response.bytes().await;

        Ok(TransportResponse {
            status,
            content_type,
            elapsed: start.elapsed(),
        })
    }
}

/// A server whose connection backlog is exhausted shows up as a
/// connect-level failure; that is the transient signal worth one retry.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        TransportError::Busy(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

/// Factory producing `HttpTransport` contexts with a shared timeout.
pub struct HttpTransportFactory {
    timeout: Duration,
}

impl HttpTransportFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl TransportFactory for HttpTransportFactory {
    fn new_context(&self) -> anyhow::Result<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::new(self.timeout)?))
    }
}
