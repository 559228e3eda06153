//! Rule-based opponent for single-player mode.

use rand::{Rng, seq::SliceRandom};

use crate::board::{Board, Player, Position};

/// Picks a move for `me`.
///
/// Priority: complete an own line, block the opponent's line, take the
/// center, take a random free corner, take the first free cell. Returns
/// `None` on a full board.
pub fn pick_move<R: Rng + ?Sized>(board: &Board, me: Player, rng: &mut R) -> Option<Position> {
    if let Some(pos) = completing_move(board, me) {
        return Some(pos);
    }
    if let Some(pos) = completing_move(board, me.opponent()) {
        return Some(pos);
    }
    if board.is_free(Position::CENTER) {
        return Some(Position::CENTER);
    }

    let corners: Vec<Position> = Position::CORNERS
        .into_iter()
        .filter(|&pos| board.is_free(pos))
        .collect();
    if let Some(&corner) = corners.choose(rng) {
        return Some(corner);
    }

    board.free_cells().next()
}

/// First free cell where `player` would complete a line.
fn completing_move(board: &Board, player: Player) -> Option<Position> {
    board.free_cells().find(|&pos| {
        let mut probe = *board;
        probe.place(pos, player);
        probe.winner() == Some(player)
    })
}
