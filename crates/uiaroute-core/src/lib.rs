//! # uiaroute-core
//!
//! Client-side command routing for iOS UI automation backends.
//!
//! This crate turns UIA requests ("tap this element", "wait for animations to
//! stop") into commands for the on-device automation engine, delivers them
//! over the bridge the active session selects, and validates the engine's
//! reply into a uniform `Vec<Value>` result.
//!
//! ## Modules
//!
//! - [`command`] - `uia.<name>(<args>)` command serialization
//! - [`edn`] - Structured-literal (EDN) encoding of vector and map arguments
//! - [`text`] - String escaping for quoted arguments
//! - [`response`] - Reply validation and normalization
//! - [`strategy`] - The delivery strategies a session can select
//! - [`session`] - The caller-owned description of the active session
//! - [`transport`] - HTTP transport to the device server
//! - [`host`] - Host-process bridge
//! - [`router`] - Strategy dispatch and convenience commands
//! - [`condition`] - Polling for device-side conditions
//! - [`wait`] - Deadline helper used by the poller
//! - [`config`] - Persistent configuration
//! - [`error`] - The crate error type
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use uiaroute_core::condition::ConditionPoller;
//! use uiaroute_core::config::UiaConfig;
//! use uiaroute_core::router::UiaRouter;
//! use uiaroute_core::session::AutomationSession;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UiaConfig::load();
//! let router = Arc::new(UiaRouter::from_config(&config)?);
//! let session = AutomationSession::new("shared_element");
//!
//! router.tap_mark(Some(&session), "Sign In").await?;
//!
//! let poller = ConditionPoller::from_config(router.clone(), &config);
//! poller.wait_for_none_animating(Some(&session), None).await?;
//!
//! let first = router
//!     .serialize_and_call(Some(&session), "query", &[json!("label")])
//!     .await?;
//! println!("{first}");
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod condition;
pub mod config;
pub mod edn;
pub mod error;
pub mod host;
pub mod response;
pub mod router;
pub mod session;
pub mod strategy;
pub mod text;
pub mod transport;
pub mod wait;

pub use error::{Result, RouteError, UiaError};
