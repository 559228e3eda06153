//! Commands accepted by the sync actor.

use std::{fmt, sync::Arc};

use tictactoe_core::{GameMode, GameSession};
use tictactoe_transport::{Acceptor, Connector, Discovery, PeerInfo};
use tokio::sync::oneshot;

/// A user action or query.
pub enum Command {
    SetPlayerName(String),
    SetMode(GameMode),
    /// Host a game on `acceptor`.
    Listen(Box<dyn Acceptor>),
    /// Join the game advertised by `peer`.
    Connect {
        connector: Arc<dyn Connector>,
        peer: PeerInfo,
    },
    /// Look for hosts; answered with a peers event.
    Discover(Arc<dyn Discovery>),
    PlaceMark {
        row: usize,
        col: usize,
    },
    OpenResetConfirm,
    DismissResetConfirm,
    ConfirmReset,
    AcceptRematch,
    DeclineRematch,
    CancelRematchWait,
    GoToGame,
    Quit,
    DismissAlert,
    Disconnect,
    Snapshot(oneshot::Sender<GameSession>),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetPlayerName(name) => f.debug_tuple("SetPlayerName").field(name).finish(),
            Self::SetMode(mode) => f.debug_tuple("SetMode").field(mode).finish(),
            Self::Listen(acceptor) => f
                .debug_tuple("Listen")
                .field(&acceptor.local_address())
                .finish(),
            Self::Connect { peer, .. } => f.debug_struct("Connect").field("peer", peer).finish(),
            Self::Discover(_) => f.write_str("Discover"),
            Self::PlaceMark { row, col } => f
                .debug_struct("PlaceMark")
                .field("row", row)
                .field("col", col)
                .finish(),
            Self::OpenResetConfirm => f.write_str("OpenResetConfirm"),
            Self::DismissResetConfirm => f.write_str("DismissResetConfirm"),
            Self::ConfirmReset => f.write_str("ConfirmReset"),
            Self::AcceptRematch => f.write_str("AcceptRematch"),
            Self::DeclineRematch => f.write_str("DeclineRematch"),
            Self::CancelRematchWait => f.write_str("CancelRematchWait"),
            Self::GoToGame => f.write_str("GoToGame"),
            Self::Quit => f.write_str("Quit"),
            Self::DismissAlert => f.write_str("DismissAlert"),
            Self::Disconnect => f.write_str("Disconnect"),
            Self::Snapshot(_) => f.write_str("Snapshot"),
        }
    }
}
