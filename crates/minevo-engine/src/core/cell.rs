use serde::{Deserialize, Serialize};

/// Content of a single board cell.
///
/// Non-mine cells carry the number of mines among their (up to 8)
/// orthogonal and diagonal neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum Cell {
    Mine,
    Count(u8),
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Count(0)
    }
}

impl Cell {
    /// Returns the adjacency count, or `None` for a mine.
    #[must_use]
    pub const fn count(self) -> Option<u8> {
        match self {
            Cell::Mine => None,
            Cell::Count(n) => Some(n),
        }
    }
}
