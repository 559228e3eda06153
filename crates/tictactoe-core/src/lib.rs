//! Core building blocks for a two-player tic-tac-toe game.
//!
//! - `Board` / `Player` / `Position` - the grid and outcome evaluation
//! - `GameState` - the one operation that changes a board
//! - `ai` - rule-based opponent for single-player mode
//! - `GameSession` - everything one device knows about the current game

pub mod ai;
pub mod board;
pub mod game;
pub mod session;

pub use board::{BOARD_SIZE, Board, Outcome, ParsePlayerError, Player, Position};
pub use game::{GameState, GameStatus, MoveError};
pub use session::{Dialogs, GameMode, GameSession, RematchPrompt};
