//! Game state and the single authoritative move operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, Outcome, Player, Position};

/// Game status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Moves are accepted.
    Playing,
    /// Somebody completed a line.
    Won,
    /// Board full with no line.
    Draw,
}

impl GameStatus {
    /// Whether the game is decided.
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Why a move was not applied. Rejected moves leave the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Position ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("Cell {0} is already occupied")]
    Occupied(Position),
    #[error("Game is already over")]
    GameOver,
    #[error("Not your turn")]
    NotYourTurn,
}

/// Board plus whose turn it is and how the game stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    current_player: Player,
    status: GameStatus,
    winner: Option<Player>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Empty board, X to move.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            board: Board::new(),
            current_player: Player::X,
            status: GameStatus::Playing,
            winner: None,
        }
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn current_player(&self) -> Player {
        self.current_player
    }

    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub const fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Places `player` at `(row, col)`, passes the turn to the other mark and
    /// re-evaluates the board.
    ///
    /// # Errors
    /// Returns an error, leaving the state unchanged, when the coordinate is
    /// outside the board, the cell is taken, or the game is over.
    pub fn apply_move(
        &mut self,
        row: usize,
        col: usize,
        player: Player,
    ) -> Result<Outcome, MoveError> {
        let pos = Position::new(row, col).ok_or(MoveError::OutOfBounds { row, col })?;
        if self.status.is_over() {
            return Err(MoveError::GameOver);
        }
        if !self.board.is_free(pos) {
            return Err(MoveError::Occupied(pos));
        }

        self.board.place(pos, player);
        self.current_player = player.opponent();

        let outcome = self.board.evaluate();
        match outcome {
            Outcome::Ongoing => {}
            Outcome::Won(winner) => {
                self.status = GameStatus::Won;
                self.winner = Some(winner);
            }
            Outcome::Draw => self.status = GameStatus::Draw,
        }
        tracing::trace!(%pos, %player, ?outcome, "move applied");
        Ok(outcome)
    }

    /// Clears the board; X moves first.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[cfg(test)]
    pub(crate) const fn with_board(board: Board, current_player: Player) -> Self {
        Self {
            board,
            current_player,
            status: GameStatus::Playing,
            winner: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_move_switches_player() {
        let mut game = GameState::new();
        assert_eq!(game.apply_move(0, 0, Player::X), Ok(Outcome::Ongoing));
        assert_eq!(game.current_player(), Player::O);
        assert_eq!(
            game.board().get(Position::new(0, 0).unwrap()),
            Some(Player::X)
        );
    }

    #[test]
    fn test_rejected_moves_leave_state_unchanged() {
        let mut game = GameState::new();
        game.apply_move(1, 1, Player::X).unwrap();
        let before = game.clone();

        assert_eq!(
            game.apply_move(1, 1, Player::O),
            Err(MoveError::Occupied(Position::CENTER))
        );
        assert_eq!(
            game.apply_move(3, 0, Player::O),
            Err(MoveError::OutOfBounds { row: 3, col: 0 })
        );
        assert_eq!(
            game.apply_move(0, 7, Player::O),
            Err(MoveError::OutOfBounds { row: 0, col: 7 })
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_no_moves_after_win() {
        let mut game = GameState::new();
        for (row, col, player) in [
            (0, 0, Player::X),
            (1, 0, Player::O),
            (0, 1, Player::X),
            (1, 1, Player::O),
        ] {
            game.apply_move(row, col, player).unwrap();
        }
        assert_eq!(game.apply_move(0, 2, Player::X), Ok(Outcome::Won(Player::X)));
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.winner(), Some(Player::X));

        let before = game.clone();
        assert_eq!(game.apply_move(2, 2, Player::O), Err(MoveError::GameOver));
        assert_eq!(game, before);
    }

    #[test]
    fn test_last_cell_completing_diagonal() {
        let x = Some(Player::X);
        let o = Some(Player::O);
        let board = Board::from_rows([[x, o, x], [o, x, o], [o, x, None]]);
        let mut game = GameState::with_board(board, Player::X);

        assert_eq!(game.apply_move(2, 2, Player::X), Ok(Outcome::Won(Player::X)));
        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn test_draw_status() {
        let x = Some(Player::X);
        let o = Some(Player::O);
        let board = Board::from_rows([[x, o, x], [x, o, o], [o, x, None]]);
        let mut game = GameState::with_board(board, Player::X);

        assert_eq!(game.apply_move(2, 2, Player::X), Ok(Outcome::Draw));
        assert_eq!(game.status(), GameStatus::Draw);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_reset() {
        let mut game = GameState::new();
        game.apply_move(0, 0, Player::X).unwrap();
        game.reset();
        assert_eq!(game, GameState::new());
    }
}
