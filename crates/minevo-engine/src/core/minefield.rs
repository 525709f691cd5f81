use rand::{Rng, seq::index};
use serde::Serialize;

use crate::BoardConfig;

use super::{Cell, Grid, Position};

/// Immutable mine layout of a board, with adjacency counts precomputed.
///
/// The layout is fixed once generated; all mutable play state lives in
/// [`GameBoard`](crate::GameBoard).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Minefield {
    cells: Grid<Cell>,
    mines: usize,
}

impl Minefield {
    /// Places `config.mines()` mines at distinct, uniformly random cells.
    pub fn random<R>(config: BoardConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let cols = config.cols();
        let mines = index::sample(rng, config.cell_count(), config.mines())
            .into_iter()
            .map(|i| Position::from_index(i, cols));
        Self::from_mines(config, mines)
    }

    /// Builds a layout with mines at the given positions.
    ///
    /// Duplicate positions are counted once.
    ///
    /// # Panics
    ///
    /// Panics if a position lies outside the board.
    pub fn from_mines<I>(config: BoardConfig, mines: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        let mut cells = Grid::filled(config.rows(), config.cols(), Cell::Count(0));
        let mut count = 0;
        for pos in mines {
            if cells[pos].is_mine() {
                continue;
            }
            cells[pos] = Cell::Mine;
            count += 1;
            for n in cells.neighbors(pos) {
                if let Cell::Count(c) = &mut cells[n] {
                    *c += 1;
                }
            }
        }
        Self {
            cells,
            mines: count,
        }
    }

    /// Creates a `Minefield` from ASCII art for testing.
    /// `*` marks a mine, `.` marks a safe cell. Rows are listed top to bottom.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let lines: Vec<Vec<char>> = art
            .lines()
            .map(|line| line.chars().filter(|c| *c == '*' || *c == '.').collect())
            .filter(|line: &Vec<char>| !line.is_empty())
            .collect();
        let rows = lines.len();
        let cols = lines.first().map_or(0, Vec::len);
        for (y, line) in lines.iter().enumerate() {
            assert_eq!(
                line.len(),
                cols,
                "Each row must have exactly {cols} cells, got {} at row {y}",
                line.len()
            );
        }
        let mines = lines.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter(|(_, ch)| **ch == '*')
                .map(move |(col, _)| Position::new(row, col))
        });
        Self::from_mines(BoardConfig::unchecked(rows, cols, 0), mines)
    }

    #[must_use]
    pub fn cells(&self) -> &Grid<Cell> {
        &self.cells
    }

    #[must_use]
    pub fn cell(&self, pos: Position) -> Cell {
        self.cells[pos]
    }

    #[must_use]
    pub fn mines(&self) -> usize {
        self.mines
    }

    #[must_use]
    pub fn safe_cells(&self) -> usize {
        self.cells.len() - self.mines
    }

    pub fn mine_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.is_mine())
            .map(|(pos, _)| pos)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn brute_force_count(field: &Minefield, pos: Position) -> u8 {
        let mut count = 0;
        for row in pos.row.saturating_sub(1)..=pos.row + 1 {
            for col in pos.col.saturating_sub(1)..=pos.col + 1 {
                let n = Position::new(row, col);
                if n != pos && field.cells().get(n).is_some_and(|c| c.is_mine()) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_random_layout_matches_brute_force() {
        let mut rng = Pcg32::seed_from_u64(7);
        let configs = [(10, 10, 10), (5, 20, 40), (20, 5, 1), (3, 3, 8), (1, 9, 4)];
        for (rows, cols, mines) in configs {
            let config = BoardConfig::new(rows, cols, mines).unwrap();
            for _ in 0..20 {
                let field = Minefield::random(config, &mut rng);
                assert_eq!(field.mines(), mines);
                assert_eq!(field.mine_positions().count(), mines);
                for (pos, cell) in field.cells().iter() {
                    if let Cell::Count(n) = cell {
                        assert_eq!(
                            *n,
                            brute_force_count(&field, pos),
                            "count mismatch at {pos} on {rows}x{cols}/{mines}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_ascii() {
        let field = Minefield::from_ascii(
            "
            *..
            ...
            ..*
            ",
        );
        assert_eq!(field.mines(), 2);
        assert_eq!(field.cells().rows(), 3);
        assert_eq!(field.cells().cols(), 3);
        assert_eq!(field.cell(Position::new(1, 1)), Cell::Count(2));
        assert_eq!(field.cell(Position::new(0, 2)), Cell::Count(0));
        assert_eq!(field.cell(Position::new(2, 0)), Cell::Count(0));
        assert_eq!(field.cell(Position::new(0, 1)), Cell::Count(1));
    }

    #[test]
    fn test_duplicate_mines_counted_once() {
        let config = BoardConfig::new(2, 2, 1).unwrap();
        let field = Minefield::from_mines(config, [Position::new(0, 0), Position::new(0, 0)]);
        assert_eq!(field.mines(), 1);
        assert_eq!(field.cell(Position::new(1, 1)), Cell::Count(1));
    }
}
