use minevo_engine::{GameBoard, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{NoMoveAvailableError, PolicyNetwork};

/// How an agent chooses its next cell.
///
/// Strategies only read the board; the caller applies the returned move with
/// [`GameBoard::reveal`].
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
pub enum MoveStrategy {
    /// Uniformly random unrevealed cell.
    #[display("random-search")]
    RandomSearch,
    /// Highest-scoring unrevealed cell according to the agent's policy network.
    #[default]
    #[display("policy-driven")]
    PolicyDriven,
}

impl MoveStrategy {
    pub fn select_move<R>(
        self,
        board: &GameBoard,
        policy: &PolicyNetwork,
        rng: &mut R,
    ) -> Result<Position, NoMoveAvailableError>
    where
        R: Rng + ?Sized,
    {
        match self {
            MoveStrategy::RandomSearch => random_unrevealed(board, rng),
            MoveStrategy::PolicyDriven => policy.select_move(board),
        }
    }
}

/// Rejection-samples the whole grid until an unrevealed cell comes up.
pub fn random_unrevealed<R>(board: &GameBoard, rng: &mut R) -> Result<Position, NoMoveAvailableError>
where
    R: Rng + ?Sized,
{
    if board.is_fully_revealed() {
        return Err(NoMoveAvailableError);
    }
    loop {
        let pos = Position::new(
            rng.random_range(0..board.rows()),
            rng.random_range(0..board.cols()),
        );
        if !board.is_revealed(pos) {
            return Ok(pos);
        }
    }
}
