//! Transport seam between the engine and the network.
//!
//! Workers only see the [`Transport`] trait. [`HyperTransport`] is the pooled
//! HTTP(S) implementation used by the binary; tests plug in stubs.

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, CACHE_CONTROL};
use hyper::{Body as HyperBody, Client, Request};
use hyper_tls::HttpsConnector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::TransportSetupError;
use crate::models::{ErrorKind, HttpMethod, TestConfiguration};

pub type HttpsClient = Client<HttpsConnector<HttpConnector>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A fully resolved request, ready to be sent.
#[derive(Debug, Clone)]
pub struct SynthesizedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body_size: u64,
    pub latency: Duration,
}

/// Request-level failure. Recorded on the outcome, never fatal to a run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection closed: {0}")]
    Closed(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::Timeout => ErrorKind::Timeout,
            TransportError::Connect(_) => ErrorKind::Connect,
            TransportError::Closed(_) => ErrorKind::Closed,
            TransportError::Protocol(_) => ErrorKind::Protocol,
            TransportError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    fn from_hyper(err: &hyper::Error) -> Self {
        if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_closed() || err.is_incomplete_message() {
            TransportError::Closed(err.to_string())
        } else {
            TransportError::Protocol(err.to_string())
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn issue_request(
        &self,
        request: &SynthesizedRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;

    /// Called once after every worker has been joined.
    async fn close(&self) {}
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub max_connections: usize,
    pub max_connections_per_host: usize,
    pub keepalive_timeout: Duration,
    pub verify_tls: bool,
}

impl From<&TestConfiguration> for TransportSettings {
    fn from(config: &TestConfiguration) -> Self {
        Self {
            max_connections: config.max_connections,
            max_connections_per_host: config.max_connections_per_host,
            keepalive_timeout: config.keepalive_timeout(),
            verify_tls: config.verify_tls,
        }
    }
}

/// Pooled keep-alive client. In-flight requests are capped at
/// `max_connections` by a semaphore; idle sockets per host by hyper's pool.
pub struct HyperTransport {
    client: HttpsClient,
    permits: Arc<Semaphore>,
}

impl HyperTransport {
    pub fn new(settings: &TransportSettings) -> Result<Self, TransportSetupError> {
        if settings.max_connections == 0 {
            return Err(TransportSetupError::InvalidLimit(
                "max connections must be greater than zero".to_string(),
            ));
        }
        if settings.max_connections_per_host == 0 {
            return Err(TransportSetupError::InvalidLimit(
                "max connections per host must be greater than zero".to_string(),
            ));
        }

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_keepalive(Some(settings.keepalive_timeout));
        http.set_connect_timeout(Some(CONNECT_TIMEOUT));

        let mut tls = native_tls::TlsConnector::builder();
        if !settings.verify_tls {
            tls.danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let tls = tokio_native_tls::TlsConnector::from(tls.build()?);
        let https = HttpsConnector::from((http, tls));

        let client: HttpsClient = Client::builder()
            .pool_idle_timeout(settings.keepalive_timeout)
            .pool_max_idle_per_host(settings.max_connections_per_host)
            .build::<_, HyperBody>(https);

        debug!(
            max_connections = settings.max_connections,
            per_host = settings.max_connections_per_host,
            verify_tls = settings.verify_tls,
            "HTTP transport ready"
        );

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(settings.max_connections)),
        })
    }

    fn build_request(request: &SynthesizedRequest) -> Result<Request<HyperBody>, TransportError> {
        let mut builder = Request::builder()
            .method(hyper::Method::from(request.method))
            .uri(request.url.as_str())
            .header(ACCEPT, "application/json, text/html, */*")
            .header(CACHE_CONTROL, "no-cache");

        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let body = match &request.body {
            Some(bytes) => HyperBody::from(bytes.clone()),
            None => HyperBody::empty(),
        };

        builder
            .body(body)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn issue_request(
        &self,
        request: &SynthesizedRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TransportError::Closed("transport is shut down".to_string()))?;

        let hyper_request = Self::build_request(request)?;
        let start = Instant::now();

        let exchange = async {
            let response = self.client.request(hyper_request).await?;
            let status = response.status().as_u16();
            let bytes = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, hyper::Error>((status, bytes.len() as u64))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Err(_) => Err(TransportError::Timeout),
            Ok(Err(e)) => Err(TransportError::from_hyper(&e)),
            Ok(Ok((status, body_size))) => Ok(TransportResponse {
                status,
                body_size,
                latency: start.elapsed(),
            }),
        }
    }

    async fn close(&self) {
        self.permits.close();
        debug!("HTTP transport closed");
    }
}
