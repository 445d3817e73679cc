//! Strategy routing for UIA commands.
//!
//! [`UiaRouter`] is the entry point for sending a UIA command. For each call
//! it:
//!
//! 1. rejects the call if no [`AutomationSession`] is active,
//! 2. parses the session's strategy,
//! 3. delivers the command over the HTTP route or the host bridge,
//! 4. returns the result as a `Vec<Value>`.
//!
//! HTTP replies go through [`handle_uia_results`]. Host replies are already a
//! single map and are wrapped in a one-element vector unchanged.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use uiaroute_core::config::UiaConfig;
//! use uiaroute_core::router::UiaRouter;
//! use uiaroute_core::session::AutomationSession;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let router = UiaRouter::from_config(&UiaConfig::load())?;
//! let session = AutomationSession::new("preferences");
//!
//! let results = router.dispatch(Some(&session), "query", &[json!("button")]).await?;
//! println!("{} matches", results.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, info_span, warn, Instrument};

use crate::command::{make_uia_parameters, serialize_command};
use crate::config::UiaConfig;
use crate::error::{Result, RouteError, UiaError};
use crate::host::{HostBridge, HostError, HostProcess};
use crate::response::{handle_uia_results, route_handle_response};
use crate::session::AutomationSession;
use crate::transport::{HttpTransport, TransportError, UiaTransport};

/// Default name of the device server's UIA route.
pub const DEFAULT_UIA_ROUTE: &str = "uia";

/// Routes UIA commands to the bridge selected by the active session.
///
/// The router holds no per-session state; the session is passed into every
/// call, so one router can serve sessions that come and go.
#[derive(Clone)]
pub struct UiaRouter {
    transport: Arc<dyn UiaTransport>,
    host: Option<Arc<dyn HostBridge>>,
    uia_route: String,
}

impl UiaRouter {
    /// Creates a router over the given HTTP transport, with no host bridge.
    pub fn new(transport: Arc<dyn UiaTransport>) -> Self {
        Self {
            transport,
            host: None,
            uia_route: DEFAULT_UIA_ROUTE.to_string(),
        }
    }

    /// Attaches the bridge used by the `host` strategy.
    pub fn with_host(mut self, host: Arc<dyn HostBridge>) -> Self {
        self.host = Some(host);
        self
    }

    /// Overrides the route UIA commands are posted to.
    pub fn with_uia_route(mut self, route: impl Into<String>) -> Self {
        self.uia_route = route.into();
        self
    }

    /// Builds a router from configuration.
    ///
    /// Uses [`HttpTransport`] for the HTTP strategies and, when
    /// `host_program` is set, a [`HostProcess`] for the host strategy.
    pub fn from_config(config: &UiaConfig) -> std::result::Result<Self, TransportError> {
        let transport = HttpTransport::new(config.server_url.clone(), config.http_timeout())?;
        let mut router = Self::new(Arc::new(transport)).with_uia_route(config.uia_route.clone());
        if let Some(program) = &config.host_program {
            let host = HostProcess::new(program.clone())
                .with_args(config.host_args.iter().cloned())
                .with_timeout(config.http_timeout());
            router = router.with_host(Arc::new(host));
        }
        Ok(router)
    }

    /// The route UIA commands are posted to.
    pub fn uia_route(&self) -> &str {
        &self.uia_route
    }

    /// Sends `name(args)` to the engine and returns the normalized result.
    ///
    /// # Errors
    ///
    /// - [`RouteError::NoActiveSession`] if `session` is `None`
    /// - [`RouteError::InvalidStrategy`] if the session's strategy is unknown
    /// - any transport, host, protocol or backend error, unchanged
    pub async fn dispatch(
        &self,
        session: Option<&AutomationSession>,
        name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>> {
        let session = session.ok_or(RouteError::NoActiveSession)?;
        let strategy = session.strategy()?;

        let span = info_span!("uia_dispatch", command = name, %strategy);
        async {
            let start = Instant::now();
            let result = if strategy.uses_http() {
                self.uia_over_http(name, args).await
            } else {
                self.uia_over_host(session, name, args).await
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(values) => debug!(elapsed_ms, count = values.len(), "dispatch complete"),
                Err(UiaError::Backend { detail, .. }) => {
                    warn!(elapsed_ms, %detail, "engine reported an error")
                }
                Err(e) => debug!(elapsed_ms, error = %e, "dispatch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Dispatches and returns only the first result element.
    ///
    /// An empty result yields `Value::Null`. Use [`dispatch`](Self::dispatch)
    /// when every element is needed.
    pub async fn serialize_and_call(
        &self,
        session: Option<&AutomationSession>,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        let mut results = self.dispatch(session, name, args).await?;
        Ok(if results.is_empty() {
            Value::Null
        } else {
            results.swap_remove(0)
        })
    }

    async fn uia_over_http(&self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        let command = serialize_command(name, args);
        debug!(%command, route = %self.uia_route, "sending over http");
        let body = self
            .transport
            .post(&self.uia_route, &make_uia_parameters(&command))
            .await?;
        let reply = route_handle_response(&body, &command)?;
        handle_uia_results(&reply, &command)
    }

    async fn uia_over_host(
        &self,
        session: &AutomationSession,
        name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>> {
        let host = self.host.as_ref().ok_or_else(|| {
            HostError::NotInstalled("no host bridge configured for the 'host' strategy".into())
        })?;
        let reply = host.send_command(session, name, args).await?;
        Ok(vec![Value::Object(reply)])
    }

    // -----------------------------------------------------------------------
    // Convenience commands
    // -----------------------------------------------------------------------

    /// Taps at a screen offset (`uia.tapOffset`).
    pub async fn tap_offset(
        &self,
        session: Option<&AutomationSession>,
        x: f64,
        y: f64,
    ) -> Result<Value> {
        self.serialize_and_call(session, "tapOffset", &[json!({ "x": x, "y": y })])
            .await
    }

    /// Taps the element with the given mark (`uia.tapMark`).
    pub async fn tap_mark(&self, session: Option<&AutomationSession>, mark: &str) -> Result<Value> {
        self.serialize_and_call(session, "tapMark", &[json!(mark)]).await
    }

    /// Types text with the on-screen keyboard (`uia.typeString`).
    pub async fn enter_text(&self, session: Option<&AutomationSession>, text: &str) -> Result<Value> {
        self.serialize_and_call(session, "typeString", &[json!(text)]).await
    }

    /// Queries the view hierarchy (`uia.query`) and returns every match.
    pub async fn query(
        &self,
        session: Option<&AutomationSession>,
        selector: &str,
    ) -> Result<Vec<Value>> {
        self.dispatch(session, "query", &[json!(selector)]).await
    }
}
