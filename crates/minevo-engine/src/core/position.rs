use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell coordinate on the board, zero-based from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Converts a row-major flat index into a position on a board `cols` wide.
    #[must_use]
    pub const fn from_index(index: usize, cols: usize) -> Self {
        Self {
            row: index / cols,
            col: index % cols,
        }
    }

    /// Returns the row-major flat index of this position on a board `cols` wide.
    #[must_use]
    pub const fn to_index(self, cols: usize) -> usize {
        self.row * cols + self.col
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_conversion() {
        let cols = 7;
        for index in 0..35 {
            let pos = Position::from_index(index, cols);
            assert!(pos.col < cols);
            assert_eq!(pos.to_index(cols), index);
        }
        assert_eq!(Position::from_index(15, 7), Position::new(2, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(3, 9).to_string(), "(3, 9)");
    }
}
