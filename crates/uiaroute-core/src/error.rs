//! Crate-wide error type.
//!
//! [`UiaError`] unifies the failures of every dispatch path behind one type so
//! callers can match on the error kind regardless of which bridge produced it.
//!
//! | Kind | Variant | Retried by this crate |
//! |------|---------|-----------------------|
//! | Routing | [`UiaError::Route`] | no |
//! | Reply shape | [`UiaError::Protocol`] | no |
//! | Engine-reported | [`UiaError::Backend`] | no |
//! | HTTP transport | [`UiaError::Transport`] | no |
//! | Host bridge | [`UiaError::Host`] | no |
//! | Wait deadline | [`UiaError::Timeout`] | n/a |

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::host::HostError;
use crate::response::ProtocolError;
use crate::transport::TransportError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UiaError>;

/// Errors raised while choosing a bridge for a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No automation session is attached, so there is nothing to route to.
    #[error("no active automation session; start one before sending UIA commands")]
    NoActiveSession,

    /// The session named a strategy this client does not know.
    #[error("invalid UIA strategy '{0}'; expected one of: preferences, shared_element, host")]
    InvalidStrategy(String),
}

/// Any failure of a dispatch or wait call.
#[derive(Error, Debug)]
pub enum UiaError {
    /// The command could not be routed.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The backend reply did not have the expected shape.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The automation engine itself reported an error.
    #[error("UIA command '{command}' failed: {detail}")]
    Backend {
        /// The command that was sent.
        command: String,
        /// The engine's error payload, verbatim.
        detail: Value,
    },

    /// The HTTP transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The host-process bridge failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A wait deadline elapsed before its condition was satisfied.
    #[error("{message}")]
    Timeout {
        /// Caller-supplied description of what was being waited for.
        message: String,
        /// The caller's timeout, without the client-side margin.
        timeout: Duration,
    },

    /// The wait was cancelled before it finished.
    #[error("wait cancelled")]
    Cancelled,
}
