//! The active automation session.
//!
//! An [`AutomationSession`] describes the run loop that is currently driving
//! the device's UIA engine. Callers own it: test setup creates one when the
//! run loop starts and drops it at teardown. Every dispatch takes an
//! `Option<&AutomationSession>`; `None` means nothing is running and the
//! command is rejected before any strategy is considered.
//!
//! # Example
//!
//! ```
//! use uiaroute_core::session::AutomationSession;
//!
//! let session: AutomationSession =
//!     serde_json::from_str(r#"{"uia_strategy": "preferences", "pid": 4242}"#).unwrap();
//! assert_eq!(session.pid, Some(4242));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::strategy::Strategy;

/// Description of a running automation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationSession {
    /// Strategy name as reported by the run loop. Parsed on every dispatch.
    pub uia_strategy: String,
    /// Process id of the host-side run loop, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Device identifier the session is attached to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udid: Option<String>,
}

impl AutomationSession {
    /// Creates a session with the given strategy name.
    pub fn new(uia_strategy: impl Into<String>) -> Self {
        Self {
            uia_strategy: uia_strategy.into(),
            pid: None,
            udid: None,
        }
    }

    /// Sets the run loop's process id.
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Sets the device identifier.
    pub fn with_udid(mut self, udid: impl Into<String>) -> Self {
        self.udid = Some(udid.into());
        self
    }

    /// Parses the session's strategy name.
    pub fn strategy(&self) -> Result<Strategy, RouteError> {
        self.uia_strategy.parse()
    }
}
