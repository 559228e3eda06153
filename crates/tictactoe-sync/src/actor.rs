//! Sync actor.
//!
//! The actor is the only owner of the device's [`GameSession`]. User commands
//! and session events are serialized through one `select!` loop, so a move
//! typed by the user can never interleave with a move arriving from the
//! peer. Timers (handshake timeout, draw rematch offer, computer move) are
//! deadlines polled by the same loop.

use std::sync::Arc;

use futures::Stream;
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;
use tictactoe_core::{
    Dialogs, GameMode, GameSession, GameStatus, Outcome, Player, RematchPrompt,
};
use tictactoe_session::{ConfigError, ConnectionState, PeerSession, Role, SessionEvent};
use tictactoe_transport::{Acceptor, Connector, Discovery, PeerInfo, WireMessage, dedup_peers};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::Instant,
};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{command::Command, config::SyncConfig, event::SyncEvent};

/// Opponent name shown until the peer introduces itself.
pub const CONNECTING_PLACEHOLDER: &str = "Connecting...";
const OPPONENT_LEFT: &str = "Your opponent left the game.";
const OPPONENT_DISCONNECTED: &str = "Connection to your opponent was lost.";

/// Sync error.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Sync actor stopped")]
    Stopped,
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Cloneable command side of the actor.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    connection: watch::Receiver<ConnectionState>,
}

impl SyncHandle {
    /// Queues a command.
    ///
    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn send(&self, command: Command) -> Result<(), SyncError> {
        self.commands.send(command).map_err(|_| SyncError::Stopped)
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn set_player_name(&self, name: impl Into<String>) -> Result<(), SyncError> {
        self.send(Command::SetPlayerName(name.into()))
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn set_mode(&self, mode: GameMode) -> Result<(), SyncError> {
        self.send(Command::SetMode(mode))
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn listen(&self, acceptor: Box<dyn Acceptor>) -> Result<(), SyncError> {
        self.send(Command::Listen(acceptor))
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn connect(&self, connector: Arc<dyn Connector>, peer: PeerInfo) -> Result<(), SyncError> {
        self.send(Command::Connect { connector, peer })
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn discover(&self, discovery: Arc<dyn Discovery>) -> Result<(), SyncError> {
        self.send(Command::Discover(discovery))
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn place_mark(&self, row: usize, col: usize) -> Result<(), SyncError> {
        self.send(Command::PlaceMark { row, col })
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn confirm_reset(&self) -> Result<(), SyncError> {
        self.send(Command::ConfirmReset)
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn accept_rematch(&self) -> Result<(), SyncError> {
        self.send(Command::AcceptRematch)
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn decline_rematch(&self) -> Result<(), SyncError> {
        self.send(Command::DeclineRematch)
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn go_to_game(&self) -> Result<(), SyncError> {
        self.send(Command::GoToGame)
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn quit(&self) -> Result<(), SyncError> {
        self.send(Command::Quit)
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn dismiss_alert(&self) -> Result<(), SyncError> {
        self.send(Command::DismissAlert)
    }

    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub fn disconnect(&self) -> Result<(), SyncError> {
        self.send(Command::Disconnect)
    }

    /// Copy of the current session, taken after all earlier commands.
    ///
    /// # Errors
    /// Returns [`SyncError::Stopped`] once the actor has exited.
    pub async fn snapshot(&self) -> Result<GameSession, SyncError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| SyncError::Stopped)
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    /// Watches connection state changes.
    #[must_use]
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }
}

/// Single-consumer event side of the actor.
#[derive(Debug)]
pub struct SyncEvents {
    rx: mpsc::UnboundedReceiver<SyncEvent>,
}

impl SyncEvents {
    /// Next event; `None` once the actor has exited and the queue is drained.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<SyncEvent> {
        self.rx.try_recv().ok()
    }

    /// Events as a stream.
    pub fn into_stream(self) -> impl Stream<Item = SyncEvent> {
        UnboundedReceiverStream::new(self.rx)
    }
}

/// Starts an actor owning a fresh session in `mode`. Must be called from
/// within a tokio runtime.
///
/// # Errors
/// Returns [`SyncError::Config`] if the session settings are unusable.
pub fn spawn(
    config: SyncConfig,
    mode: GameMode,
) -> Result<(SyncHandle, SyncEvents, JoinHandle<()>), SyncError> {
    spawn_with_rng(config, mode, StdRng::from_entropy())
}

/// Like [`spawn`] with a given random source for the computer player.
///
/// # Errors
/// Returns [`SyncError::Config`] if the session settings are unusable.
pub fn spawn_with_rng(
    config: SyncConfig,
    mode: GameMode,
    rng: StdRng,
) -> Result<(SyncHandle, SyncEvents, JoinHandle<()>), SyncError> {
    let (session, session_events) = PeerSession::new(config.session.clone())?;
    let (command_tx, commands) = mpsc::unbounded_channel();
    let (events, event_rx) = mpsc::unbounded_channel();

    let handle = SyncHandle {
        commands: command_tx,
        connection: session.subscribe_state(),
    };
    let actor = SyncActor {
        config,
        session,
        session_events,
        commands,
        events,
        game: GameSession::new(mode),
        ready: false,
        pending: None,
        draw_prompt_at: None,
        ai_move_at: None,
        rng,
    };
    let task = tokio::spawn(actor.run());
    Ok((handle, SyncEvents { rx: event_rx }, task))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handshake {
    /// We sent GAME_RESET and wait for GAME_START_SYNC.
    Reset,
    /// We sent REMATCH_REQUEST and wait for REMATCH_RESPONSE.
    Rematch,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: Handshake,
    deadline: Instant,
}

struct SyncActor {
    config: SyncConfig,
    session: PeerSession,
    session_events: mpsc::UnboundedReceiver<SessionEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SyncEvent>,
    game: GameSession,
    ready: bool,
    pending: Option<Pending>,
    draw_prompt_at: Option<Instant>,
    ai_move_at: Option<Instant>,
    rng: StdRng,
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl SyncActor {
    async fn run(mut self) {
        tracing::info!(mode = ?self.game.mode(), "sync actor started");
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command).await;
                }
                Some(event) = self.session_events.recv() => self.handle_session_event(event).await,
                () = wait_until(self.pending.map(|p| p.deadline)) => self.handshake_expired().await,
                () = wait_until(self.draw_prompt_at) => self.offer_rematch_after_draw(),
                () = wait_until(self.ai_move_at) => self.play_ai_move(),
            }
        }
        self.session.disconnect().await;
        tracing::info!("sync actor stopped");
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }

    fn updated(&self) {
        self.emit(SyncEvent::Updated(Box::new(self.game.clone())));
    }

    const fn is_remote(&self) -> bool {
        matches!(self.game.mode(), GameMode::Remote)
    }

    fn pending_is(&self, kind: Handshake) -> bool {
        self.pending.is_some_and(|p| p.kind == kind)
    }

    fn start_handshake(&mut self, kind: Handshake) {
        self.pending = Some(Pending {
            kind,
            deadline: Instant::now() + self.config.handshake_timeout(),
        });
    }

    /// Sends to the peer. Failures are logged; the session reports the loss.
    async fn send(&self, msg: WireMessage) -> bool {
        match self.session.send(&msg).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(message = %msg, error = %e, "send failed");
                false
            }
        }
    }

    async fn handle_command(&mut self, command: Command) {
        tracing::debug!(?command, "command");
        match command {
            Command::SetPlayerName(name) => {
                self.game.set_local_name(&name);
                self.updated();
            }
            Command::SetMode(mode) => {
                self.clear_timers();
                self.game.set_mode(mode);
                self.updated();
            }
            Command::Listen(acceptor) => match self.session.listen(acceptor) {
                Ok(()) => self.emit(SyncEvent::ConnectionChanged(ConnectionState::Listening)),
                Err(e) => self.emit(SyncEvent::ConnectionFailed(e.to_string())),
            },
            Command::Connect { connector, peer } => match self.session.connect(connector, peer) {
                Ok(()) => self.emit(SyncEvent::ConnectionChanged(ConnectionState::Connecting)),
                Err(e) => self.emit(SyncEvent::ConnectionFailed(e.to_string())),
            },
            Command::Discover(discovery) => {
                let events = self.events.clone();
                tokio::spawn(async move {
                    let event = match discovery.discover().await {
                        Ok(peers) => SyncEvent::PeersDiscovered(dedup_peers(peers)),
                        Err(e) => SyncEvent::DiscoveryFailed(e.to_string()),
                    };
                    let _ = events.send(event);
                });
            }
            Command::PlaceMark { row, col } => self.place_mark(row, col).await,
            Command::OpenResetConfirm => {
                self.game.dialogs_mut().reset_confirm = true;
                self.updated();
            }
            Command::DismissResetConfirm => {
                self.game.dialogs_mut().reset_confirm = false;
                self.updated();
            }
            Command::ConfirmReset => self.confirm_reset().await,
            Command::AcceptRematch => self.accept_rematch().await,
            Command::DeclineRematch => self.decline_rematch().await,
            Command::CancelRematchWait => self.cancel_rematch_wait().await,
            Command::GoToGame => {
                if self.is_remote() && self.game.is_peer_connected() {
                    self.send(WireMessage::GoToGame).await;
                }
                self.emit(SyncEvent::NavigateToGame);
            }
            Command::Quit => {
                if self.is_remote() && self.game.is_peer_connected() {
                    self.send(WireMessage::GameQuit).await;
                }
                self.return_to_menu();
            }
            Command::DismissAlert => {
                if self.game.dialogs_mut().disconnect_alert.take().is_some() {
                    self.return_to_menu();
                }
            }
            Command::Disconnect => self.session.disconnect().await,
            Command::Snapshot(reply) => {
                let _ = reply.send(self.game.clone());
            }
        }
    }

    async fn place_mark(&mut self, row: usize, col: usize) {
        match self.game.mode() {
            GameMode::Remote => {
                if !self.game.is_peer_connected() {
                    tracing::debug!(row, col, "ignoring move without a peer");
                    return;
                }
                if self.pending_is(Handshake::Reset) {
                    tracing::debug!(row, col, "ignoring move while reset is pending");
                    return;
                }
                let player = self.game.local_role();
                match self.game.make_local_move(row, col) {
                    Ok(outcome) => {
                        self.send(WireMessage::Move { row, col, player }).await;
                        if outcome != Outcome::Ongoing {
                            self.send(WireMessage::GameEndSync).await;
                        }
                        self.after_move(outcome);
                    }
                    Err(e) => tracing::debug!(row, col, error = %e, "local move rejected"),
                }
            }
            GameMode::SinglePlayer => {
                if self.ai_move_at.is_some() || self.game.game().current_player() != Player::X {
                    tracing::debug!(row, col, "ignoring move during the computer's turn");
                    return;
                }
                match self.game.make_local_move(row, col) {
                    Ok(outcome) => {
                        self.after_move(outcome);
                        if outcome == Outcome::Ongoing {
                            self.ai_move_at = Some(Instant::now() + self.config.ai_delay());
                        }
                    }
                    Err(e) => tracing::debug!(row, col, error = %e, "local move rejected"),
                }
            }
            GameMode::LocalMultiplayer => match self.game.make_local_move(row, col) {
                Ok(outcome) => self.after_move(outcome),
                Err(e) => tracing::debug!(row, col, error = %e, "local move rejected"),
            },
        }
    }

    fn after_move(&mut self, outcome: Outcome) {
        self.updated();
        if outcome == Outcome::Ongoing {
            return;
        }
        tracing::info!(?outcome, "game over");
        self.emit(SyncEvent::GameOver(outcome));
        if outcome == Outcome::Draw && self.is_remote() {
            self.draw_prompt_at = Some(Instant::now() + self.config.draw_prompt_delay());
        }
    }

    fn play_ai_move(&mut self) {
        self.ai_move_at = None;
        if let Some((pos, outcome)) = self.game.ai_reply(&mut self.rng) {
            tracing::debug!(%pos, "computer moved");
            self.after_move(outcome);
        }
    }

    fn clear_timers(&mut self) {
        self.pending = None;
        self.draw_prompt_at = None;
        self.ai_move_at = None;
    }

    /// Starts a new game locally and drops any handshake in flight.
    fn commit_reset(&mut self) {
        self.clear_timers();
        self.game.reset();
        tracing::info!(local_turn = self.game.is_local_turn(), "new game");
        self.emit(SyncEvent::ResetCommitted);
        self.updated();
    }

    fn return_to_menu(&mut self) {
        self.clear_timers();
        let alert = self.game.dialogs_mut().disconnect_alert.take();
        *self.game.dialogs_mut() = Dialogs {
            disconnect_alert: alert,
            ..Dialogs::default()
        };
        self.updated();
        self.emit(SyncEvent::ReturnToMenu);
    }

    async fn confirm_reset(&mut self) {
        self.game.dialogs_mut().reset_confirm = false;
        if !self.is_remote() {
            self.commit_reset();
            return;
        }
        if !self.game.is_peer_connected() || self.pending.is_some() {
            tracing::debug!("reset not possible now");
            self.updated();
            return;
        }
        if self.send(WireMessage::GameReset).await {
            self.start_handshake(Handshake::Reset);
            self.emit(SyncEvent::ResetPending);
        }
        self.updated();
    }

    async fn accept_rematch(&mut self) {
        let prompt = self.game.dialogs_mut().rematch.take();
        self.draw_prompt_at = None;
        if !self.is_remote() {
            self.commit_reset();
            return;
        }
        if !self.game.is_peer_connected() {
            self.updated();
            return;
        }

        if prompt == Some(RematchPrompt::Incoming) {
            self.send(WireMessage::RematchResponse { accepted: true }).await;
            self.commit_reset();
            self.send(WireMessage::GameStartSync).await;
            return;
        }

        if !self.game.status().is_over() {
            tracing::debug!("no rematch before the game is decided");
        } else if self.pending.is_some() {
            tracing::debug!("handshake already in progress");
        } else if self.send(WireMessage::RematchRequest).await {
            self.start_handshake(Handshake::Rematch);
            self.game.dialogs_mut().rematch_wait = true;
            self.emit(SyncEvent::RematchWaiting);
        }
        self.updated();
    }

    async fn decline_rematch(&mut self) {
        let prompt = self.game.dialogs_mut().rematch.take();
        if self.is_remote() && self.game.is_peer_connected() {
            if prompt == Some(RematchPrompt::Incoming) {
                self.send(WireMessage::RematchResponse { accepted: false })
                    .await;
            }
            self.send(WireMessage::GameQuit).await;
        }
        self.return_to_menu();
    }

    async fn cancel_rematch_wait(&mut self) {
        if !self.pending_is(Handshake::Rematch) {
            tracing::debug!("no rematch wait to cancel");
            return;
        }
        if self.game.is_peer_connected() {
            self.send(WireMessage::GameQuit).await;
        }
        self.return_to_menu();
    }

    async fn handshake_expired(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        tracing::warn!(
            kind = ?pending.kind,
            timeout_ms = self.config.handshake_timeout_ms,
            "peer did not answer"
        );
        if self.game.is_peer_connected() {
            self.send(WireMessage::GameQuit).await;
        }
        self.emit(SyncEvent::HandshakeTimedOut);
        self.return_to_menu();
    }

    fn offer_rematch_after_draw(&mut self) {
        self.draw_prompt_at = None;
        let dialogs = self.game.dialogs();
        if !self.is_remote()
            || self.game.status() != GameStatus::Draw
            || !self.game.is_peer_connected()
            || dialogs.rematch.is_some()
            || dialogs.rematch_wait
            || self.pending.is_some()
        {
            return;
        }
        self.game.dialogs_mut().rematch = Some(RematchPrompt::Offer);
        self.emit(SyncEvent::RematchPrompt(RematchPrompt::Offer));
        self.updated();
    }

    async fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected { role } => self.on_connected(role).await,
            SessionEvent::Message(msg) => self.on_message(msg).await,
            SessionEvent::PeerLost(reason) => self.on_link_down(Some(reason.user_message())),
            SessionEvent::ConnectionFailed(reason) => {
                self.emit(SyncEvent::ConnectionChanged(ConnectionState::Disconnected));
                self.emit(SyncEvent::ConnectionFailed(reason));
            }
            SessionEvent::Closed => self.on_link_down(None),
        }
    }

    async fn on_connected(&mut self, role: Role) {
        self.ready = false;
        self.clear_timers();
        self.game.set_local_role(role.player());
        self.game.set_mode(GameMode::Remote);
        self.game.set_peer_connected(true);
        self.game.set_opponent_name(CONNECTING_PLACEHOLDER);
        tracing::info!(?role, player = %role.player(), "playing remote game");

        self.emit(SyncEvent::ConnectionChanged(ConnectionState::Connected));
        self.emit(SyncEvent::Connected { role });
        self.send(WireMessage::PlayerInfo {
            name: self.game.local_name().to_string(),
            role: role.player(),
        })
        .await;
        self.updated();
    }

    /// Link went down. `None` is a local disconnect.
    fn on_link_down(&mut self, message: Option<String>) {
        let was_connected = self.game.is_peer_connected();
        self.ready = false;
        self.clear_timers();
        self.game.set_peer_connected(false);
        let dialogs = self.game.dialogs_mut();
        dialogs.rematch = None;
        dialogs.rematch_wait = false;

        self.emit(SyncEvent::ConnectionChanged(ConnectionState::Disconnected));
        match message {
            Some(message) if was_connected => {
                self.game.dialogs_mut().disconnect_alert = Some(message.clone());
                self.emit(SyncEvent::PeerLost { message });
            }
            Some(message) => tracing::debug!(%message, "link loss already reported"),
            None => self.emit(SyncEvent::Disconnected),
        }
        self.updated();
    }

    async fn on_message(&mut self, msg: WireMessage) {
        if !self.is_remote() {
            tracing::debug!(message = %msg, "ignoring message outside remote mode");
            return;
        }
        match msg {
            WireMessage::PlayerInfo { name, role } => {
                if role == self.game.local_role() {
                    tracing::warn!(%role, "peer claims our mark, keeping connection roles");
                }
                self.game.set_opponent_name(&name);
                let name = self.game.opponent_name().to_string();
                tracing::info!(opponent = %name, "opponent joined");
                self.send(WireMessage::GameStart).await;
                self.emit(SyncEvent::OpponentJoined { name });
                self.updated();
            }
            WireMessage::GameStart => {
                if !self.ready {
                    self.ready = true;
                    self.emit(SyncEvent::Ready);
                }
            }
            WireMessage::Move { row, col, player } => self.on_remote_move(row, col, player),
            WireMessage::GameReset => {
                if self.pending_is(Handshake::Reset) {
                    tracing::debug!("resets crossed, committing the peer's");
                }
                self.commit_reset();
                self.send(WireMessage::GameStartSync).await;
            }
            WireMessage::GameStartSync => {
                if self.pending_is(Handshake::Reset) {
                    self.commit_reset();
                } else {
                    tracing::debug!("ignoring unsolicited start sync");
                }
            }
            WireMessage::RematchRequest => {
                if self.pending_is(Handshake::Rematch) {
                    self.pending = None;
                }
                self.draw_prompt_at = None;
                let dialogs = self.game.dialogs_mut();
                dialogs.rematch_wait = false;
                dialogs.rematch = Some(RematchPrompt::Incoming);
                self.emit(SyncEvent::RematchPrompt(RematchPrompt::Incoming));
                self.updated();
            }
            WireMessage::RematchResponse { accepted } => self.on_rematch_response(accepted).await,
            WireMessage::GameQuit => {
                self.clear_timers();
                let dialogs = self.game.dialogs_mut();
                dialogs.rematch = None;
                dialogs.rematch_wait = false;
                dialogs.disconnect_alert = Some(OPPONENT_LEFT.to_string());
                self.emit(SyncEvent::OpponentLeft);
                self.updated();
            }
            WireMessage::OpponentDisconnected => {
                self.clear_timers();
                self.game.set_peer_connected(false);
                let dialogs = self.game.dialogs_mut();
                dialogs.rematch = None;
                dialogs.rematch_wait = false;
                dialogs.disconnect_alert = Some(OPPONENT_DISCONNECTED.to_string());
                self.emit(SyncEvent::PeerLost {
                    message: OPPONENT_DISCONNECTED.to_string(),
                });
                self.updated();
            }
            WireMessage::GameEndSync => {
                self.game.end_turn();
                self.updated();
            }
            WireMessage::GoToGame => self.emit(SyncEvent::NavigateToGame),
            WireMessage::Heartbeat(_) => tracing::trace!("heartbeat reached the sync layer"),
        }
    }

    fn on_remote_move(&mut self, row: usize, col: usize, player: Player) {
        if self.pending_is(Handshake::Reset) {
            tracing::debug!(row, col, "dropping move while reset is pending");
            return;
        }
        let mover = self.game.local_role().opponent();
        if player != mover {
            tracing::warn!(%player, expected = %mover, "move tagged with the wrong mark");
        }
        if self.game.is_local_turn() {
            tracing::warn!(row, col, "opponent moved out of turn");
        }
        match self.game.apply_remote_move(row, col, mover) {
            Ok(outcome) => {
                tracing::debug!(row, col, %mover, "opponent moved");
                self.after_move(outcome);
            }
            Err(e) => tracing::warn!(row, col, error = %e, "rejected remote move"),
        }
    }

    async fn on_rematch_response(&mut self, accepted: bool) {
        let waiting = self.pending_is(Handshake::Rematch);
        // both sides asked at once and the peer accepted ours
        let crossed = !waiting && self.game.dialogs().rematch == Some(RematchPrompt::Incoming);
        if !waiting && !crossed {
            tracing::debug!(accepted, "ignoring rematch response, not waiting");
            return;
        }

        if accepted {
            self.commit_reset();
            self.send(WireMessage::GameStartSync).await;
        } else if waiting {
            tracing::info!("rematch declined");
            self.game.dialogs_mut().rematch_wait = false;
            self.emit(SyncEvent::RematchDeclined);
            self.return_to_menu();
        } else {
            tracing::debug!("crossed rematch declined, prompt stays");
        }
    }
}
