//! Events published by the sync actor.

use serde::Serialize;
use tictactoe_core::{GameSession, Outcome, RematchPrompt};
use tictactoe_session::{ConnectionState, Role};
use tictactoe_transport::PeerInfo;

/// One-shot notification for the UI. Each is delivered exactly once, in
/// order, to the single consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SyncEvent {
    ConnectionChanged(ConnectionState),
    /// Link is up; `role` fixes the mark for this connection.
    Connected { role: Role },
    ConnectionFailed(String),
    /// Opponent introduced itself.
    OpponentJoined { name: String },
    /// Both sides exchanged names; play may start.
    Ready,
    /// Snapshot after a mutation.
    Updated(Box<GameSession>),
    GameOver(Outcome),
    /// Our reset proposal is waiting for the peer's acknowledgement.
    ResetPending,
    /// Board cleared for a new game.
    ResetCommitted,
    RematchPrompt(RematchPrompt),
    /// Our rematch request is waiting for an answer.
    RematchWaiting,
    RematchDeclined,
    HandshakeTimedOut,
    /// Opponent quit the game.
    OpponentLeft,
    /// Link lost; `message` is the alert text.
    PeerLost { message: String },
    /// Local disconnect completed.
    Disconnected,
    PeersDiscovered(Vec<PeerInfo>),
    DiscoveryFailed(String),
    NavigateToGame,
    ReturnToMenu,
}
