//! HTTP delivery client module.
//!
//! The generator only needs one capability from the network: POST a JSON
//! envelope with the API key header and get back a status code and body.
//! [`DeliveryClient`] is that seam; [`HttpDeliveryClient`] implements it with
//! reqwest.
//!
//! Transport failures (DNS, connect, timeout) never surface as errors from
//! [`DeliveryClient::post`]. They come back as a [`DeliveryResponse`] without a
//! status code, so a sequence keeps going no matter what the network does.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::EndpointConfig;
use crate::payload::{Envelope, API_KEY_HEADER};

/// Errors that can occur inside the HTTP client.
#[derive(Debug)]
pub enum ClientError {
    /// HTTP request failed
    Request(reqwest::Error),

    /// Request timeout
    Timeout,

    /// Client configuration error
    Config(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Request(e) => write!(f, "HTTP request failed: {}", e),
            ClientError::Timeout => write!(f, "Request timed out"),
            ClientError::Config(e) => write!(f, "Client configuration error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Request(err)
        }
    }
}

/// Outcome of a single POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    /// HTTP status, or `None` when no response was received
    pub status: Option<StatusCode>,

    /// Response body, or the transport error text
    pub body: String,
}

impl DeliveryResponse {
    /// A response that came back from the server.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    /// A request that never got a response.
    pub fn transport_failure(error: &ClientError) -> Self {
        Self {
            status: None,
            body: error.to_string(),
        }
    }

    /// Only `200 OK` counts as delivered.
    pub fn is_ok(&self) -> bool {
        self.status == Some(StatusCode::OK)
    }
}

/// Capability consumed by the generator: POST an envelope, get a response.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// POST `envelope` as JSON to `path`, with `api_key` in the API key header.
    async fn post(&self, path: &str, api_key: &str, envelope: &Envelope) -> DeliveryResponse;
}

/// Counters kept by [`HttpDeliveryClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    /// Requests answered with 200 OK
    pub delivered: u64,

    /// Requests answered with any other status
    pub rejected: u64,

    /// Requests that got no response at all
    pub transport_failures: u64,
}

/// reqwest-backed delivery client.
///
/// The underlying `reqwest::Client` is reused across requests, so
/// connections to the listener are pooled.
pub struct HttpDeliveryClient {
    client: Client,

    /// Base URL, without trailing slash
    base_url: String,

    /// Request timeout duration
    timeout: Duration,

    stats: RwLock<ClientStats>,
}

impl HttpDeliveryClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn new(config: &EndpointConfig) -> Result<Self, ClientError> {
        Self::with_settings(config.base_url.clone(), config.request_timeout)
    }

    /// Create a client with custom settings.
    pub fn with_settings(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            stats: RwLock::new(ClientStats::default()),
        })
    }

    /// Send a single request and read the whole body.
    async fn send_request(
        &self,
        url: &str,
        api_key: &str,
        envelope: &Envelope,
    ) -> Result<DeliveryResponse, ClientError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .timeout(self.timeout)
            .json(envelope)
            .send()
            .await?;

        let status = response.status();

        // A body that cannot be read means the exchange did not complete
        match response.text().await {
            Ok(body) => Ok(DeliveryResponse::new(status, body)),
            Err(e) => {
                warn!(status = %status, error = %e, "Failed to read response body");
                Err(e.into())
            }
        }
    }

    fn record(&self, response: &DeliveryResponse) {
        if let Ok(mut stats) = self.stats.write() {
            match response.status {
                Some(StatusCode::OK) => stats.delivered += 1,
                Some(_) => stats.rejected += 1,
                None => stats.transport_failures += 1,
            }
        }
    }

    /// Get the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the request timeout duration.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get current client statistics.
    pub fn stats(&self) -> ClientStats {
        self.stats.read().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn post(&self, path: &str, api_key: &str, envelope: &Envelope) -> DeliveryResponse {
        let url = format!("{}{}", self.base_url, path);

        debug!(url = %url, envelope = envelope.kind(), "Posting envelope");

        let response = match self.send_request(&url, api_key, envelope).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "Request did not reach the listener");
                DeliveryResponse::transport_failure(&e)
            }
        };

        self.record(&response);
        response
    }
}
