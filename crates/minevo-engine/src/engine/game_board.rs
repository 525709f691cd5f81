use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::{Cell, Grid, Minefield, Position};

use super::{BoardConfig, BoardSnapshot};

/// Terminal or non-terminal state of a board.
///
/// Transitions are one-directional: `InProgress → Lost` or `InProgress → Won`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum GameStatus {
    InProgress,
    Lost,
    Won,
}

/// Result of a [`GameBoard::reveal`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum RevealOutcome {
    /// The board was terminal, or the cell was already revealed or flagged.
    Ignored,
    /// A safe cell was revealed, along with `cells - 1` cascaded neighbors.
    Revealed { cells: usize },
    /// A mine was revealed and the game is lost.
    Exploded,
}

/// One puzzle instance: an immutable mine layout plus the mutable play state.
///
/// All mutation goes through [`reveal`](Self::reveal) and
/// [`toggle_flag`](Self::toggle_flag). Observers take a [`BoardSnapshot`].
///
/// # Fitness
///
/// Every safe cell that becomes revealed adds its adjacency count to the
/// board's fitness exactly once. Mines add nothing. Fitness never changes
/// after the board becomes terminal, except through
/// [`normalize_fitness`](Self::normalize_fitness) which the evolution step
/// applies to finished boards.
///
/// # Example
///
/// ```
/// use minevo_engine::{GameBoard, Minefield, Position};
///
/// let field = Minefield::from_ascii(
///     "
///     ....
///     ....
///     ...*
///     ",
/// );
/// let mut board = GameBoard::from_minefield(field);
/// board.reveal(Position::new(0, 0));
///
/// assert!(board.status().is_won());
/// assert_eq!(board.revealed_safe_cells(), 11);
/// ```
#[derive(Debug, Clone)]
pub struct GameBoard {
    config: BoardConfig,
    minefield: Minefield,
    revealed: Grid<bool>,
    flagged: Grid<bool>,
    status: GameStatus,
    moves_played: Vec<Position>,
    revealed_safe: usize,
    fitness: f32,
}

impl GameBoard {
    /// Generates a board with a random mine layout.
    #[must_use]
    pub fn new(config: BoardConfig) -> Self {
        Self::with_rng(config, &mut rand::rng())
    }

    /// Like [`Self::new`], but draws mine positions from `rng`.
    pub fn with_rng<R>(config: BoardConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_minefield(Minefield::random(config, rng))
    }

    /// Wraps an existing mine layout in a fresh, unrevealed board.
    #[must_use]
    pub fn from_minefield(minefield: Minefield) -> Self {
        let rows = minefield.cells().rows();
        let cols = minefield.cells().cols();
        Self {
            config: BoardConfig::unchecked(rows, cols, minefield.mines()),
            revealed: Grid::filled(rows, cols, false),
            flagged: Grid::filled(rows, cols, false),
            minefield,
            status: GameStatus::InProgress,
            moves_played: Vec::new(),
            revealed_safe: 0,
            fitness: 0.0,
        }
    }

    #[must_use]
    pub fn config(&self) -> BoardConfig {
        self.config
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.config.rows()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.config.cols()
    }

    #[must_use]
    pub fn mines(&self) -> usize {
        self.minefield.mines()
    }

    #[must_use]
    pub fn minefield(&self) -> &Minefield {
        &self.minefield
    }

    #[must_use]
    pub fn cell(&self, pos: Position) -> Cell {
        self.minefield.cell(pos)
    }

    #[must_use]
    pub fn revealed(&self) -> &Grid<bool> {
        &self.revealed
    }

    #[must_use]
    pub fn flagged(&self) -> &Grid<bool> {
        &self.flagged
    }

    #[must_use]
    pub fn is_revealed(&self, pos: Position) -> bool {
        self.revealed[pos]
    }

    #[must_use]
    pub fn is_flagged(&self, pos: Position) -> bool {
        self.flagged[pos]
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.status.is_in_progress()
    }

    /// Moves accepted by [`reveal`](Self::reveal), in play order.
    #[must_use]
    pub fn moves_played(&self) -> &[Position] {
        &self.moves_played
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    #[must_use]
    pub fn revealed_safe_cells(&self) -> usize {
        self.revealed_safe
    }

    /// Returns `true` once every cell on the board is revealed.
    #[must_use]
    pub fn is_fully_revealed(&self) -> bool {
        self.revealed.as_slice().iter().all(|r| *r)
    }

    /// Divides fitness by the population total. A non-positive total leaves
    /// fitness unchanged.
    pub fn normalize_fitness(&mut self, total: f32) {
        if total > 0.0 {
            self.fitness /= total;
        }
    }

    /// Reveals the cell at `pos`.
    ///
    /// Revealing a `0` cell cascades through all connected `0` cells and their
    /// borders using an explicit work list, skipping flagged cells. Revealing
    /// a mine loses the game and exposes every mine.
    ///
    /// # Panics
    ///
    /// Panics if `pos` lies outside the board.
    pub fn reveal(&mut self, pos: Position) -> RevealOutcome {
        if self.is_terminal() || self.revealed[pos] || self.flagged[pos] {
            return RevealOutcome::Ignored;
        }

        self.moves_played.push(pos);
        if self.minefield.cell(pos).is_mine() {
            self.revealed[pos] = true;
            self.status = GameStatus::Lost;
            self.reveal_all_mines();
            return RevealOutcome::Exploded;
        }

        let cells = self.flood_reveal(pos);
        self.update_won();
        RevealOutcome::Revealed { cells }
    }

    /// Toggles the flag at `pos`. Ignored on terminal boards and revealed cells.
    ///
    /// # Panics
    ///
    /// Panics if `pos` lies outside the board.
    pub fn toggle_flag(&mut self, pos: Position) {
        if self.is_terminal() || self.revealed[pos] {
            return;
        }
        self.flagged[pos] = !self.flagged[pos];
        // Flags never reveal cells, so this only confirms the current state.
        self.update_won();
    }

    /// Takes a read-only copy of the play state for rendering or recording.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::new(self)
    }

    fn flood_reveal(&mut self, origin: Position) -> usize {
        let mut revealed = 0;
        let mut stack = vec![origin];
        self.revealed[origin] = true;

        while let Some(pos) = stack.pop() {
            let Cell::Count(count) = self.minefield.cell(pos) else {
                unreachable!("mines are never queued for flood reveal");
            };
            revealed += 1;
            self.revealed_safe += 1;
            self.fitness += f32::from(count);

            if count != 0 {
                continue;
            }
            for next in self.minefield.cells().neighbors(pos) {
                if !self.revealed[next] && !self.flagged[next] {
                    self.revealed[next] = true;
                    stack.push(next);
                }
            }
        }
        revealed
    }

    fn reveal_all_mines(&mut self) {
        for pos in self.minefield.mine_positions() {
            self.revealed[pos] = true;
        }
    }

    fn update_won(&mut self) {
        if self.revealed_safe == self.minefield.safe_cells() {
            self.status = GameStatus::Won;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn board(art: &str) -> GameBoard {
        GameBoard::from_minefield(Minefield::from_ascii(art))
    }

    fn revealed_count(board: &GameBoard) -> usize {
        board.revealed().as_slice().iter().filter(|r| **r).count()
    }

    #[test]
    fn test_new_board_is_blank() {
        let config = BoardConfig::new(6, 7, 5).unwrap();
        let board = GameBoard::with_rng(config, &mut Pcg32::seed_from_u64(1));
        assert_eq!(board.status(), GameStatus::InProgress);
        assert_eq!(board.mines(), 5);
        assert_eq!(board.fitness(), 0.0);
        assert_eq!(revealed_count(&board), 0);
        assert!(board.moves_played().is_empty());
        assert!(!board.is_terminal());
    }

    mod reveal {
        use super::*;

        #[test]
        fn test_count_cell_does_not_cascade() {
            // 2x2 with a single mine diagonal to (0, 0): every safe cell shows 1.
            let mut board = board(
                "
                ..
                .*
                ",
            );
            let outcome = board.reveal(Position::new(0, 0));
            assert_eq!(outcome, RevealOutcome::Revealed { cells: 1 });
            assert_eq!(revealed_count(&board), 1);
            assert_eq!(board.fitness(), 1.0);
            assert_eq!(board.status(), GameStatus::InProgress);
        }

        #[test]
        fn test_zero_cell_floods_all_but_corner_mine() {
            let mut board = board(
                "
                .....
                .....
                .....
                .....
                ....*
                ",
            );
            let outcome = board.reveal(Position::new(0, 0));
            assert_eq!(outcome, RevealOutcome::Revealed { cells: 24 });
            for (pos, revealed) in board.revealed().iter() {
                assert_eq!(*revealed, pos != Position::new(4, 4), "at {pos}");
            }
            assert_eq!(board.status(), GameStatus::Won);
            // Three cells border the mine, each contributing 1.
            assert_eq!(board.fitness(), 3.0);
        }

        #[test]
        fn test_flood_stops_at_numbered_border() {
            let mut board = board(
                "
                ...*.
                ...*.
                ...*.
                ",
            );
            board.reveal(Position::new(1, 0));
            for (pos, revealed) in board.revealed().iter() {
                assert_eq!(*revealed, pos.col <= 2, "at {pos}");
            }
            assert_eq!(board.status(), GameStatus::InProgress);
        }

        #[test]
        fn test_flood_skips_flagged_cells() {
            let mut board = board(
                "
                .....
                .....
                ....*
                ",
            );
            let flag = Position::new(0, 4);
            board.toggle_flag(flag);
            board.reveal(Position::new(0, 0));
            assert!(!board.is_revealed(flag));
            assert!(board.is_flagged(flag));
            assert_eq!(board.status(), GameStatus::InProgress);
        }

        #[test]
        fn test_flagged_cell_is_not_revealed_directly() {
            let mut board = board(
                "
                ..
                .*
                ",
            );
            let pos = Position::new(0, 0);
            board.toggle_flag(pos);
            assert_eq!(board.reveal(pos), RevealOutcome::Ignored);
            assert!(!board.is_revealed(pos));
            assert!(board.moves_played().is_empty());
        }

        #[test]
        fn test_revealing_twice_is_ignored() {
            let mut board = board(
                "
                ...
                .*.
                ",
            );
            let pos = Position::new(0, 0);
            board.reveal(pos);
            let fitness = board.fitness();
            assert_eq!(board.reveal(pos), RevealOutcome::Ignored);
            assert_eq!(board.fitness(), fitness);
            assert_eq!(board.moves_played(), &[pos]);
        }

        #[test]
        fn test_mine_loses_and_reveals_all_mines() {
            let mut board = board(
                "
                *..
                ...
                .*.
                ",
            );
            board.reveal(Position::new(0, 2));
            let fitness = board.fitness();
            assert_eq!(board.reveal(Position::new(0, 0)), RevealOutcome::Exploded);
            assert_eq!(board.status(), GameStatus::Lost);
            assert!(board.is_revealed(Position::new(2, 1)));
            assert_eq!(board.fitness(), fitness);
            assert_eq!(board.moves_played().len(), 2);
        }

        #[test]
        fn test_no_mutation_after_terminal() {
            let mut board = board(
                "
                *..
                ...
                ",
            );
            board.reveal(Position::new(0, 0));
            assert!(board.is_terminal());
            let revealed = board.revealed().clone();
            let fitness = board.fitness();

            assert_eq!(board.reveal(Position::new(1, 2)), RevealOutcome::Ignored);
            board.toggle_flag(Position::new(1, 1));
            assert_eq!(board.revealed(), &revealed);
            assert!(!board.is_flagged(Position::new(1, 1)));
            assert_eq!(board.fitness(), fitness);
            assert_eq!(board.status(), GameStatus::Lost);
        }

        #[test]
        fn test_win_by_revealing_every_safe_cell() {
            let mut board = board(
                "
                .*
                ",
            );
            assert_eq!(board.reveal(Position::new(0, 0)), RevealOutcome::Revealed { cells: 1 });
            assert_eq!(board.status(), GameStatus::Won);
            assert!(!board.is_revealed(Position::new(0, 1)));
        }
    }

    #[test]
    fn test_fitness_counts_each_cell_once() {
        let mut rng = Pcg32::seed_from_u64(42);
        let config = BoardConfig::new(8, 8, 10).unwrap();
        for _ in 0..50 {
            let mut board = GameBoard::with_rng(config, &mut rng);
            let positions: Vec<_> = board.minefield().cells().positions().collect();
            for pos in positions {
                if board.cell(pos).is_mine() {
                    continue;
                }
                board.reveal(pos);
            }
            let expected: u32 = board
                .minefield()
                .cells()
                .iter()
                .filter_map(|(_, c)| c.count())
                .map(u32::from)
                .sum();
            #[expect(clippy::cast_precision_loss)]
            let expected = expected as f32;
            assert_eq!(board.fitness(), expected);
            assert_eq!(board.status(), GameStatus::Won);
        }
    }

    #[test]
    fn test_status_is_monotone_under_random_play() {
        let mut rng = Pcg32::seed_from_u64(3);
        let config = BoardConfig::new(6, 6, 8).unwrap();
        for _ in 0..30 {
            let mut board = GameBoard::with_rng(config, &mut rng);
            let mut last_terminal = None;
            for _ in 0..100 {
                let pos = Position::new(rng.random_range(0..6), rng.random_range(0..6));
                if rng.random_bool(0.2) {
                    board.toggle_flag(pos);
                } else {
                    board.reveal(pos);
                }
                if let Some(status) = last_terminal {
                    assert_eq!(board.status(), status);
                } else if board.is_terminal() {
                    last_terminal = Some(board.status());
                }
            }
        }
    }

    #[test]
    fn test_toggle_flag() {
        let mut board = board(
            "
            ..
            .*
            ",
        );
        let pos = Position::new(1, 1);
        board.toggle_flag(pos);
        assert!(board.is_flagged(pos));
        board.toggle_flag(pos);
        assert!(!board.is_flagged(pos));

        board.reveal(Position::new(0, 0));
        board.toggle_flag(Position::new(0, 0));
        assert!(!board.is_flagged(Position::new(0, 0)));
        assert_eq!(board.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_normalize_fitness() {
        let mut board = board(
            "
            ..
            .*
            ",
        );
        board.reveal(Position::new(0, 0));
        board.normalize_fitness(0.0);
        assert_eq!(board.fitness(), 1.0);
        board.normalize_fitness(4.0);
        assert_eq!(board.fitness(), 0.25);
    }
}
