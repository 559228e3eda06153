//! Board representation and outcome evaluation.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// Every line that wins the game: three rows, three columns, two diagonals.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// A mark on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// Moves first after every reset.
    X,
    /// Moves second.
    O,
}

impl Player {
    /// The other mark.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    /// Single-letter tag used on the wire.
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::O => "O",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Error returned when a player tag is neither `X` nor `O`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid player tag: {0:?}")]
pub struct ParsePlayerError(pub String);

impl FromStr for Player {
    type Err = ParsePlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Self::X),
            "O" => Ok(Self::O),
            other => Err(ParsePlayerError(other.to_string())),
        }
    }
}

/// A cell coordinate known to be inside the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    /// The four corners.
    pub const CORNERS: [Self; 4] = [
        Self { row: 0, col: 0 },
        Self { row: 0, col: 2 },
        Self { row: 2, col: 0 },
        Self { row: 2, col: 2 },
    ];

    /// The center cell.
    pub const CENTER: Self = Self { row: 1, col: 1 };

    /// Returns `None` when the coordinate falls outside `[0, 3) x [0, 3)`.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn row(self) -> usize {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> usize {
        self.col
    }

    /// All nine cells in row-major order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Self { row, col }))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "winner", rename_all = "snake_case")]
pub enum Outcome {
    /// No line is complete and a cell is still free.
    Ongoing,
    /// The player holds a full row, column or diagonal.
    Won(Player),
    /// Every cell is taken and nobody holds a line.
    Draw,
}

/// 3x3 grid of optional marks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Player>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An empty board.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Builds a board from rows, mostly useful in tests.
    #[must_use]
    pub const fn from_rows(cells: [[Option<Player>; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    /// Mark at the position, if any.
    #[must_use]
    pub const fn get(&self, pos: Position) -> Option<Player> {
        self.cells[pos.row][pos.col]
    }

    #[must_use]
    pub const fn is_free(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    /// Rows of the grid.
    #[must_use]
    pub const fn rows(&self) -> &[[Option<Player>; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Free cells in row-major order.
    pub fn free_cells(&self) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(|&pos| self.is_free(pos))
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free_cells().next().is_none()
    }

    /// Writes a mark. Only [`crate::GameState::apply_move`] and the AI's
    /// look-ahead call this.
    pub(crate) const fn place(&mut self, pos: Position, player: Player) {
        self.cells[pos.row][pos.col] = Some(player);
    }

    /// Owner of a complete line, if any.
    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(row, col)| self.cells[row][col]);
            match (a, b, c) {
                (Some(p1), Some(p2), Some(p3)) if p1 == p2 && p2 == p3 => Some(p1),
                _ => None,
            }
        })
    }

    /// Classifies the board as ongoing, won or drawn.
    #[must_use]
    pub fn evaluate(&self) -> Outcome {
        if let Some(winner) = self.winner() {
            Outcome::Won(winner)
        } else if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::Ongoing
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f, "---+---+---")?;
            }
            let marks: Vec<&str> = row
                .iter()
                .map(|cell| cell.map_or(" ", Player::as_tag))
                .collect();
            writeln!(f, " {} | {} | {} ", marks[0], marks[1], marks[2])?;
        }
        Ok(())
    }
}
