//! HTTP transport to the device's automation server.
//!
//! The preferences and shared-element strategies post UIA commands to a route
//! on the server embedded in the app under test. [`UiaTransport`] is the seam
//! the router talks to; [`HttpTransport`] is the `reqwest`-backed
//! implementation.
//!
//! Retry and backoff are not handled here; a failed post is reported once.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use serde_json::json;
//! use uiaroute_core::transport::{HttpTransport, UiaTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new("http://127.0.0.1:37265", Duration::from_secs(30))?;
//! let body = transport.post("uia", &json!({"command": "uia.elementDump()"})).await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, debug_span, trace, Instrument};

/// Errors raised while talking to the device's HTTP server.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("could not build HTTP client: {0}")]
    Client(String),

    /// The request failed before a response arrived.
    #[error("HTTP request to '{route}' failed: {source}")]
    Request {
        /// Route that was posted to.
        route: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the configured timeout.
    #[error("HTTP request to '{0}' timed out")]
    Timeout(String),

    /// The server answered with a non-success status code.
    #[error("HTTP request to '{route}' returned status {status}: {body}")]
    Status {
        /// Route that was posted to.
        route: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}

/// Delivers a JSON payload to a named route and returns the raw body.
#[async_trait]
pub trait UiaTransport: Send + Sync {
    /// Posts `payload` to `route` and returns the response body.
    async fn post(&self, route: &str, payload: &Value) -> Result<String, TransportError>;
}

/// [`UiaTransport`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the server at `base_url`.
    ///
    /// `timeout` bounds each request from connect to the end of the body.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn route_url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl UiaTransport for HttpTransport {
    async fn post(&self, route: &str, payload: &Value) -> Result<String, TransportError> {
        let url = self.route_url(route);
        let span = debug_span!("http_post", route);
        async {
            trace!(%url, "posting");
            let map_err = |source: reqwest::Error| {
                if source.is_timeout() {
                    TransportError::Timeout(route.to_string())
                } else {
                    TransportError::Request {
                        route: route.to_string(),
                        source,
                    }
                }
            };

            let response = self
                .client
                .post(&url)
                .json(payload)
                .send()
                .await
                .map_err(map_err)?;

            let status = response.status();
            let body = response.text().await.map_err(map_err)?;
            debug!(status = status.as_u16(), body_bytes = body.len(), "response received");

            if !status.is_success() {
                return Err(TransportError::Status {
                    route: route.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(body)
        }
        .instrument(span)
        .await
    }
}
