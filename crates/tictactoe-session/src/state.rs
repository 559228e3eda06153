//! Connection phases and peer roles.

use std::fmt;

use serde::{Deserialize, Serialize};
use tictactoe_core::Player;

/// Connection phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Dialing a peer.
    Connecting,
    /// Waiting for a peer to dial in.
    Listening,
    Connected,
}

impl ConnectionState {
    /// Whether a listen or connect may start.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Listening => "listening",
            Self::Connected => "connected",
        })
    }
}

/// Which side of the link this device is. Fixed for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Accepted the connection. Plays X.
    Host,
    /// Dialed the host. Plays O.
    Joiner,
}

impl Role {
    /// Mark played by this role.
    #[must_use]
    pub const fn player(self) -> Player {
        match self {
            Self::Host => Player::X,
            Self::Joiner => Player::O,
        }
    }
}
