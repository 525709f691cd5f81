use std::fmt;

use serde::Serialize;

use crate::core::{Cell, Grid, Position};

use super::{GameBoard, GameStatus};

/// Read-only copy of a board's play state.
///
/// Renderers and recorders consume snapshots instead of borrowing the live
/// [`GameBoard`], so they can never mutate it.
///
/// The [`Display`](fmt::Display) implementation draws a plain-text view:
///
/// ```text
/// # hidden    F flagged    * mine    . revealed zero    1-8 count
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub grid: Grid<Cell>,
    pub revealed: Grid<bool>,
    pub flagged: Grid<bool>,
    pub status: GameStatus,
    pub moves_played: Vec<Position>,
    pub fitness: f32,
}

impl BoardSnapshot {
    pub(crate) fn new(board: &GameBoard) -> Self {
        Self {
            grid: board.minefield().cells().clone(),
            revealed: board.revealed().clone(),
            flagged: board.flagged().clone(),
            status: board.status(),
            moves_played: board.moves_played().to_vec(),
            fitness: board.fitness(),
        }
    }

    fn symbol(&self, pos: Position) -> char {
        if !self.revealed[pos] {
            return if self.flagged[pos] { 'F' } else { '#' };
        }
        match self.grid[pos] {
            Cell::Mine => '*',
            Cell::Count(0) => '.',
            Cell::Count(n) => char::from(b'0' + n),
        }
    }
}

impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                if col > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", self.symbol(Position::new(row, col)))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{GameBoard, Minefield};

    use super::*;

    #[test]
    fn test_display() {
        let mut board = GameBoard::from_minefield(Minefield::from_ascii(
            "
            ...
            ..*
            ",
        ));
        board.toggle_flag(Position::new(1, 2));
        board.reveal(Position::new(0, 0));
        let text = board.snapshot().to_string();
        assert_eq!(text, ". 1 #\n. 1 F\n");
    }

    #[test]
    fn test_serializes_moves_and_status() {
        let mut board = GameBoard::from_minefield(Minefield::from_ascii("*."));
        board.reveal(Position::new(0, 0));
        let json = serde_json::to_value(board.snapshot()).unwrap();
        assert_eq!(json["status"], "Lost");
        assert_eq!(json["moves_played"][0]["row"], 0);
        assert_eq!(json["grid"]["cells"][0], "Mine");
        assert_eq!(json["grid"]["cells"][1]["Count"], 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut board = GameBoard::from_minefield(Minefield::from_ascii(".*"));
        let before = board.snapshot();
        board.reveal(Position::new(0, 0));
        assert!(!before.revealed[Position::new(0, 0)]);
        assert!(board.snapshot().status.is_won());
    }
}
