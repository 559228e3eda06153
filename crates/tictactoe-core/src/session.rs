//! Per-device game session.
//!
//! Each device owns one [`GameSession`]. In remote play the two copies are
//! kept consistent by the synchronization protocol; nothing here talks to
//! the network.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    ai,
    board::{Outcome, Player, Position},
    game::{GameState, GameStatus, MoveError},
};

/// Fallback display name for the local player.
pub const DEFAULT_LOCAL_NAME: &str = "Player";
/// Fallback display name for the opponent.
pub const DEFAULT_OPPONENT_NAME: &str = "Opponent";

/// How the game is being played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Human X against the AI playing O.
    #[default]
    SinglePlayer,
    /// Two humans sharing one device.
    LocalMultiplayer,
    /// Two devices over a peer link.
    Remote,
}

/// Origin of a rematch prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RematchPrompt {
    /// Raised locally after a finished game: accepting proposes a rematch.
    Offer,
    /// The peer proposed a rematch: accepting answers it.
    Incoming,
}

/// Dialogs waiting for the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogs {
    pub reset_confirm: bool,
    pub rematch: Option<RematchPrompt>,
    pub rematch_wait: bool,
    pub disconnect_alert: Option<String>,
}

/// Everything one device knows about the current game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    game: GameState,
    mode: GameMode,
    is_local_turn: bool,
    is_peer_connected: bool,
    local_name: String,
    opponent_name: String,
    local_role: Player,
    dialogs: Dialogs,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

impl GameSession {
    /// Fresh session in the given mode.
    #[must_use]
    pub fn new(mode: GameMode) -> Self {
        Self {
            game: GameState::new(),
            mode,
            is_local_turn: true,
            is_peer_connected: false,
            local_name: DEFAULT_LOCAL_NAME.to_string(),
            opponent_name: DEFAULT_OPPONENT_NAME.to_string(),
            local_role: Player::X,
            dialogs: Dialogs::default(),
        }
    }

    #[must_use]
    pub const fn game(&self) -> &GameState {
        &self.game
    }

    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.game.status()
    }

    #[must_use]
    pub const fn is_local_turn(&self) -> bool {
        self.is_local_turn
    }

    #[must_use]
    pub const fn is_peer_connected(&self) -> bool {
        self.is_peer_connected
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[must_use]
    pub fn opponent_name(&self) -> &str {
        &self.opponent_name
    }

    #[must_use]
    pub const fn local_role(&self) -> Player {
        self.local_role
    }

    #[must_use]
    pub const fn dialogs(&self) -> &Dialogs {
        &self.dialogs
    }

    pub const fn dialogs_mut(&mut self) -> &mut Dialogs {
        &mut self.dialogs
    }

    /// Switches mode and starts a new game.
    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
        self.reset();
    }

    /// Stores both display names, normalized.
    pub fn set_player_names(&mut self, local: &str, opponent: &str) {
        self.local_name = normalize_name(local, DEFAULT_LOCAL_NAME);
        self.opponent_name = normalize_name(opponent, DEFAULT_OPPONENT_NAME);
    }

    pub fn set_local_name(&mut self, name: &str) {
        self.local_name = normalize_name(name, DEFAULT_LOCAL_NAME);
    }

    pub fn set_opponent_name(&mut self, name: &str) {
        self.opponent_name = normalize_name(name, DEFAULT_OPPONENT_NAME);
    }

    /// Mark this device plays in remote mode. Fixed for a connection.
    pub const fn set_local_role(&mut self, role: Player) {
        self.local_role = role;
    }

    pub const fn set_peer_connected(&mut self, connected: bool) {
        self.is_peer_connected = connected;
    }

    /// Applies a move made on this device.
    ///
    /// In remote mode the move is made with the local role and only on the
    /// local turn; afterwards it is the peer's turn. In the other modes the
    /// current player moves.
    ///
    /// # Errors
    /// Returns the rule violation; the session is unchanged.
    pub fn make_local_move(&mut self, row: usize, col: usize) -> Result<Outcome, MoveError> {
        let player = match self.mode {
            GameMode::Remote => {
                if !self.is_local_turn {
                    return Err(MoveError::NotYourTurn);
                }
                self.local_role
            }
            GameMode::SinglePlayer | GameMode::LocalMultiplayer => self.game.current_player(),
        };

        let outcome = self.game.apply_move(row, col, player)?;
        self.is_local_turn = match self.mode {
            GameMode::Remote => false,
            GameMode::SinglePlayer | GameMode::LocalMultiplayer => outcome == Outcome::Ongoing,
        };
        Ok(outcome)
    }

    /// Applies a move received from the peer; afterwards it is the local
    /// turn unless the game ended.
    ///
    /// # Errors
    /// Returns the rule violation; the session is unchanged.
    pub fn apply_remote_move(
        &mut self,
        row: usize,
        col: usize,
        player: Player,
    ) -> Result<Outcome, MoveError> {
        let outcome = self.game.apply_move(row, col, player)?;
        self.is_local_turn = outcome == Outcome::Ongoing;
        Ok(outcome)
    }

    /// Lets the AI answer in single-player mode when it is O's turn.
    pub fn ai_reply<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(Position, Outcome)> {
        if self.mode != GameMode::SinglePlayer
            || self.game.status().is_over()
            || self.game.current_player() != Player::O
        {
            return None;
        }
        let pos = ai::pick_move(self.game.board(), Player::O, rng)?;
        let outcome = self
            .game
            .apply_move(pos.row(), pos.col(), Player::O)
            .ok()?;
        self.is_local_turn = outcome == Outcome::Ongoing;
        Some((pos, outcome))
    }

    /// New game. X moves first, so in remote mode the local turn belongs
    /// to whichever device holds X.
    pub fn reset(&mut self) {
        self.game.reset();
        self.is_local_turn = match self.mode {
            GameMode::Remote => self.local_role == Player::X,
            GameMode::SinglePlayer | GameMode::LocalMultiplayer => true,
        };
        self.dialogs = Dialogs::default();
    }

    /// Nobody holds the turn once a game is decided.
    pub const fn end_turn(&mut self) {
        self.is_local_turn = false;
    }

    /// Whether the local side won the finished game.
    #[must_use]
    pub fn is_local_winner(&self) -> bool {
        match self.mode {
            GameMode::SinglePlayer => self.game.winner() == Some(Player::X),
            GameMode::LocalMultiplayer => self.game.winner().is_some(),
            GameMode::Remote => self.game.winner() == Some(self.local_role),
        }
    }

    /// One-line description of whose turn it is or how the game ended.
    #[must_use]
    pub fn status_line(&self) -> String {
        match (self.game.status(), self.mode) {
            (GameStatus::Draw, _) => "Draw!".to_string(),
            (GameStatus::Won, GameMode::LocalMultiplayer) => match self.game.winner() {
                Some(winner) => format!("Player {winner} wins!"),
                None => "Game over".to_string(),
            },
            (GameStatus::Won, GameMode::SinglePlayer) => {
                if self.is_local_winner() {
                    "You win!".to_string()
                } else {
                    "The computer wins!".to_string()
                }
            }
            (GameStatus::Won, GameMode::Remote) => {
                if self.is_local_winner() {
                    "You win!".to_string()
                } else {
                    format!("{} wins!", self.opponent_name)
                }
            }
            (GameStatus::Playing, GameMode::SinglePlayer) => {
                if self.game.current_player() == Player::X {
                    "Your turn".to_string()
                } else {
                    "Computer's turn".to_string()
                }
            }
            (GameStatus::Playing, GameMode::LocalMultiplayer) => {
                format!("Player {}'s turn", self.game.current_player())
            }
            (GameStatus::Playing, GameMode::Remote) => {
                if self.is_local_turn {
                    "Your turn".to_string()
                } else {
                    format!("{}'s turn", self.opponent_name)
                }
            }
        }
    }
}

/// Trims, falls back to `fallback` when empty, capitalizes the first letter.
fn normalize_name(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    let name = if trimmed.is_empty() { fallback } else { trimmed };
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn remote(role: Player) -> GameSession {
        let mut session = GameSession::new(GameMode::Remote);
        session.set_local_role(role);
        session.set_peer_connected(true);
        session.reset();
        session
    }

    #[test]
    fn test_host_moves_first_after_reset() {
        let host = remote(Player::X);
        let joiner = remote(Player::O);
        assert!(host.is_local_turn());
        assert!(!joiner.is_local_turn());
        assert_eq!(host.game().current_player(), Player::X);
    }

    #[test]
    fn test_remote_local_move_hands_turn_over() {
        let mut host = remote(Player::X);
        assert_eq!(host.make_local_move(0, 0), Ok(Outcome::Ongoing));
        assert!(!host.is_local_turn());
        assert_eq!(host.make_local_move(0, 1), Err(MoveError::NotYourTurn));
    }

    #[test]
    fn test_remote_move_gives_turn_back() {
        let mut joiner = remote(Player::O);
        joiner.apply_remote_move(1, 1, Player::X).unwrap();
        assert!(joiner.is_local_turn());
        assert_eq!(joiner.game().current_player(), Player::O);
        assert_eq!(joiner.make_local_move(0, 0), Ok(Outcome::Ongoing));
    }

    #[test]
    fn test_remote_move_ending_game_clears_turn() {
        let mut joiner = remote(Player::O);
        for (row, col, player) in [
            (0, 0, Player::X),
            (1, 0, Player::O),
            (0, 1, Player::X),
            (1, 1, Player::O),
        ] {
            joiner.apply_remote_move(row, col, player).unwrap();
        }
        assert_eq!(
            joiner.apply_remote_move(0, 2, Player::X),
            Ok(Outcome::Won(Player::X))
        );
        assert!(!joiner.is_local_turn());
        assert!(!joiner.is_local_winner());
        assert_eq!(joiner.status_line(), "Opponent wins!");
    }

    #[test]
    fn test_local_multiplayer_alternates() {
        let mut session = GameSession::new(GameMode::LocalMultiplayer);
        session.make_local_move(0, 0).unwrap();
        session.make_local_move(1, 1).unwrap();
        let rows = session.game().board().rows();
        assert_eq!(rows[0][0], Some(Player::X));
        assert_eq!(rows[1][1], Some(Player::O));
        assert_eq!(session.status_line(), "Player X's turn");
    }

    #[test]
    fn test_ai_replies_only_on_its_turn() {
        let mut session = GameSession::new(GameMode::SinglePlayer);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(session.ai_reply(&mut rng).is_none());

        session.make_local_move(0, 0).unwrap();
        let (pos, outcome) = session.ai_reply(&mut rng).unwrap();
        assert_eq!(pos, Position::CENTER);
        assert_eq!(outcome, Outcome::Ongoing);
        assert_eq!(session.game().current_player(), Player::X);
        assert!(session.ai_reply(&mut rng).is_none());
    }

    #[test]
    fn test_reset_clears_dialogs() {
        let mut session = remote(Player::O);
        session.dialogs_mut().rematch = Some(RematchPrompt::Incoming);
        session.dialogs_mut().disconnect_alert = Some("gone".to_string());
        session.reset();
        assert_eq!(session.dialogs(), &Dialogs::default());
    }

    #[test]
    fn test_name_normalization() {
        let mut session = GameSession::default();
        session.set_player_names("  ana ", "");
        assert_eq!(session.local_name(), "Ana");
        assert_eq!(session.opponent_name(), DEFAULT_OPPONENT_NAME);
        session.set_local_name("   ");
        assert_eq!(session.local_name(), DEFAULT_LOCAL_NAME);
        session.set_opponent_name("émile");
        assert_eq!(session.opponent_name(), "Émile");
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = remote(Player::X);
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["mode"], "remote");
        assert_eq!(json["local_role"], "X");
        assert_eq!(json["is_local_turn"], true);
    }
}
