//! Session errors and disconnect reasons.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::ConnectionState;

/// Error returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session is busy ({0})")]
    Busy(ConnectionState),
    #[error("Not connected")]
    NotConnected,
    #[error("Send timed out")]
    SendTimeout,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Why an established link went down. The display text is meant for the
/// user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DisconnectReason {
    #[error("The opponent closed the connection")]
    PeerClosed,
    #[error("Connection error: {0}")]
    ReadFailed(String),
    #[error("Could not reach the opponent: {0}")]
    WriteFailed(String),
    #[error("The opponent stopped responding")]
    SendTimedOut,
    #[error("Connection lost: no response from the opponent")]
    HeartbeatTimeout,
    #[error("The opponent sent invalid data")]
    ProtocolViolation,
}

impl DisconnectReason {
    /// Message for the disconnect alert.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
