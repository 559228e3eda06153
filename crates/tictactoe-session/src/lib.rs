//! Session layer for the peer link.
//!
//! Provides:
//! - `PeerSession` - listen/connect, framed sends, heartbeat and liveness
//! - `SessionConfig` - timing and framing limits
//! - `SessionEvent` - one-shot notifications for the layer above

pub mod config;
pub mod error;
pub mod peer;
pub mod state;

pub use config::{ConfigError, SessionConfig};
pub use error::{DisconnectReason, SessionError};
pub use peer::{PeerSession, SessionEvent};
pub use state::{ConnectionState, Role};
