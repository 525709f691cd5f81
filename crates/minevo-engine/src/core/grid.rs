use std::ops::{Index, IndexMut};

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::Position;

/// Offsets of the 8-connected neighborhood, in row-major order.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Dense row-major matrix indexed by [`Position`].
///
/// Used for the cell layout as well as the revealed and flagged masks, so all
/// three share the same bounds checks and neighborhood enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T>
where
    T: Clone,
{
    /// Creates a `rows × cols` grid with every cell set to `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }
}

impl<T> Grid<T> {
    /// Creates a grid by calling `f` for every position in row-major order.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(Position) -> T,
    {
        let cells = (0..rows * cols)
            .map(|i| f(Position::from_index(i, cols)))
            .collect();
        Self { rows, cols, cells }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells (`rows × cols`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub const fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[must_use]
    pub fn get(&self, pos: Position) -> Option<&T> {
        if !self.contains(pos) {
            return None;
        }
        self.cells.get(pos.to_index(self.cols))
    }

    /// Returns the in-bounds 8-connected neighbors of `pos`.
    ///
    /// Corner cells have 3 neighbors, edge cells 5, interior cells 8.
    #[must_use]
    pub fn neighbors(&self, pos: Position) -> ArrayVec<Position, 8> {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|&(dr, dc)| {
                let row = pos.row.checked_add_signed(dr)?;
                let col = pos.col.checked_add_signed(dc)?;
                let next = Position::new(row, col);
                self.contains(next).then_some(next)
            })
            .collect()
    }

    /// Iterates over all positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<T> {
        let cols = self.cols;
        (0..self.cells.len()).map(move |i| Position::from_index(i, cols))
    }

    /// Iterates over `(position, value)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, v)| (Position::from_index(i, self.cols), v))
    }

    /// Returns the cells as a flat row-major slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    fn index(&self, pos: Position) -> &T {
        assert!(
            self.contains(pos),
            "position {pos} out of bounds for {}x{} grid",
            self.rows,
            self.cols
        );
        &self.cells[pos.to_index(self.cols)]
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    fn index_mut(&mut self, pos: Position) -> &mut T {
        assert!(
            self.contains(pos),
            "position {pos} out of bounds for {}x{} grid",
            self.rows,
            self.cols
        );
        &mut self.cells[pos.to_index(self.cols)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_counts() {
        let grid = Grid::filled(4, 5, ());
        assert_eq!(grid.neighbors(Position::new(0, 0)).len(), 3);
        assert_eq!(grid.neighbors(Position::new(3, 4)).len(), 3);
        assert_eq!(grid.neighbors(Position::new(0, 2)).len(), 5);
        assert_eq!(grid.neighbors(Position::new(2, 0)).len(), 5);
        assert_eq!(grid.neighbors(Position::new(1, 1)).len(), 8);
    }

    #[test]
    fn test_neighbors_exclude_self_and_stay_adjacent() {
        let grid = Grid::filled(3, 3, ());
        let center = Position::new(1, 1);
        let neighbors = grid.neighbors(center);
        assert!(!neighbors.contains(&center));
        for n in neighbors {
            assert!(n.row.abs_diff(center.row) <= 1);
            assert!(n.col.abs_diff(center.col) <= 1);
        }
    }

    #[test]
    fn test_single_cell_grid_has_no_neighbors() {
        let grid = Grid::filled(1, 1, 0_u8);
        assert!(grid.neighbors(Position::new(0, 0)).is_empty());
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let grid = Grid::from_fn(2, 3, |p| p.to_index(3));
        assert_eq!(grid.as_slice(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(grid[Position::new(1, 2)], 5);
        assert_eq!(grid.get(Position::new(2, 0)), None);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_out_of_bounds_panics() {
        let grid = Grid::filled(2, 2, false);
        let _ = grid[Position::new(0, 2)];
    }
}
