use serde::{Deserialize, Serialize};

/// Error returned when board dimensions or mine count are out of range.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardConfigError {
    #[display("board must have at least one row and one column, got {rows}x{cols}")]
    EmptyBoard { rows: usize, cols: usize },
    #[display("mine count {mines} must be less than cell count {cells}")]
    TooManyMines { mines: usize, cells: usize },
}

/// Validated board dimensions and mine count.
///
/// Construction through [`BoardConfig::new`] guarantees `rows ≥ 1`, `cols ≥ 1`
/// and `mines < rows × cols`, so at least one safe cell always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBoardConfig")]
pub struct BoardConfig {
    rows: usize,
    cols: usize,
    mines: usize,
}

#[derive(Deserialize)]
struct RawBoardConfig {
    rows: usize,
    cols: usize,
    mines: usize,
}

impl TryFrom<RawBoardConfig> for BoardConfig {
    type Error = BoardConfigError;

    fn try_from(raw: RawBoardConfig) -> Result<Self, Self::Error> {
        BoardConfig::new(raw.rows, raw.cols, raw.mines)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            mines: 10,
        }
    }
}

impl BoardConfig {
    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self, BoardConfigError> {
        if rows == 0 || cols == 0 {
            return Err(BoardConfigError::EmptyBoard { rows, cols });
        }
        let cells = rows * cols;
        if mines >= cells {
            return Err(BoardConfigError::TooManyMines { mines, cells });
        }
        Ok(Self { rows, cols, mines })
    }

    pub(crate) const fn unchecked(rows: usize, cols: usize, mines: usize) -> Self {
        Self { rows, cols, mines }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub const fn mines(&self) -> usize {
        self.mines
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mines_filling_the_board() {
        assert_eq!(
            BoardConfig::new(2, 2, 4),
            Err(BoardConfigError::TooManyMines { mines: 4, cells: 4 })
        );
        assert!(BoardConfig::new(2, 2, 5).is_err());
        assert!(BoardConfig::new(2, 2, 3).is_ok());
    }

    #[test]
    fn test_rejects_empty_dimensions() {
        assert_eq!(
            BoardConfig::new(0, 5, 0),
            Err(BoardConfigError::EmptyBoard { rows: 0, cols: 5 })
        );
        assert!(BoardConfig::new(5, 0, 0).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: BoardConfig = serde_json::from_str(r#"{"rows":5,"cols":6,"mines":7}"#).unwrap();
        assert_eq!(ok.cell_count(), 30);

        let err = serde_json::from_str::<BoardConfig>(r#"{"rows":2,"cols":2,"mines":9}"#);
        assert!(err.unwrap_err().to_string().contains("must be less than"));
    }
}
