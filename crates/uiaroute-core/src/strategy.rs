//! UIA delivery strategies.
//!
//! The automation session reports how UIA commands reach the on-device
//! engine. Two strategies go through the device's HTTP server; the third
//! hands the command to a host-side process that drives the engine directly.

use std::fmt;
use std::str::FromStr;

use crate::error::RouteError;

/// How a UIA command is delivered to the automation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// HTTP route, engine reads commands via the app's preferences.
    Preferences,
    /// HTTP route, engine reads commands via a shared element.
    SharedElement,
    /// Host-side automation process.
    Host,
}

impl Strategy {
    /// The textual name used in session descriptions and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Preferences => "preferences",
            Strategy::SharedElement => "shared_element",
            Strategy::Host => "host",
        }
    }

    /// Returns `true` if commands travel over the device's HTTP server.
    pub fn uses_http(&self) -> bool {
        match self {
            Strategy::Preferences | Strategy::SharedElement => true,
            Strategy::Host => false,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = RouteError;

    /// Parses a strategy name. A leading `:` is accepted so symbol-style
    /// names (`:host`) read the same as plain ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(':') {
            "preferences" => Ok(Strategy::Preferences),
            "shared_element" => Ok(Strategy::SharedElement),
            "host" => Ok(Strategy::Host),
            _ => Err(RouteError::InvalidStrategy(s.to_string())),
        }
    }
}
