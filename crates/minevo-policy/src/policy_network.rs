use minevo_engine::{BoardConfig, Cell, GameBoard, Position};
use rand::RngCore;

use crate::{
    NoMoveAvailableError, WeightShapeError,
    network::{FeedForward, NetworkBackend, Topology},
    tensor::Tensor,
};

/// Input value for a cell that has not been revealed.
const UNREVEALED_INPUT: f32 = -1.0;
/// Input value for a revealed mine.
const REVEALED_MINE_INPUT: f32 = 9.0;

/// Neural move policy for boards of one fixed size.
///
/// Maps a board's visible state to one score per cell and picks the
/// highest-scoring unrevealed cell. The underlying network is released when
/// the policy is dropped or [`dispose`](Self::dispose)d.
#[derive(Debug)]
pub struct PolicyNetwork {
    config: BoardConfig,
    network: Box<dyn FeedForward>,
}

impl PolicyNetwork {
    /// Creates a policy with randomly initialized weights.
    pub fn random<B>(backend: &B, config: BoardConfig, rng: &mut dyn RngCore) -> Self
    where
        B: NetworkBackend + ?Sized,
    {
        let network = backend.init(Topology::for_board(config), rng);
        Self { config, network }
    }

    /// Creates a policy from an ordered weight sequence.
    pub fn from_weights<B>(
        backend: &B,
        config: BoardConfig,
        weights: Vec<Tensor>,
    ) -> Result<Self, WeightShapeError>
    where
        B: NetworkBackend + ?Sized,
    {
        let network = backend.with_weights(Topology::for_board(config), weights)?;
        Ok(Self { config, network })
    }

    #[must_use]
    pub fn config(&self) -> BoardConfig {
        self.config
    }

    #[must_use]
    pub fn topology(&self) -> Topology {
        self.network.topology()
    }

    /// Scores every cell of `board`, in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `board` has different dimensions than this policy.
    #[must_use]
    pub fn predict(&self, board: &GameBoard) -> Vec<f32> {
        self.network.forward(&self.encode_input(board))
    }

    /// Returns the highest-scoring unrevealed cell.
    ///
    /// Revealed cells are masked out and NaN scores rank below every number.
    /// Ties go to the lowest index.
    pub fn select_move(&self, board: &GameBoard) -> Result<Position, NoMoveAvailableError> {
        select_unrevealed(&self.predict(board), board)
    }

    /// Returns a copy of all weight tensors in layer order.
    #[must_use]
    pub fn clone_weights(&self) -> Vec<Tensor> {
        self.network.weights()
    }

    pub fn replace_weights(&mut self, weights: Vec<Tensor>) -> Result<(), WeightShapeError> {
        self.network.set_weights(weights)
    }

    /// Releases the network's numeric resources.
    pub fn dispose(self) {
        drop(self);
    }

    fn encode_input(&self, board: &GameBoard) -> Vec<f32> {
        assert_eq!(
            (board.rows(), board.cols()),
            (self.config.rows(), self.config.cols()),
            "board dimensions do not match policy"
        );
        let mut input = Vec::with_capacity(board.rows() * board.cols() + 1);
        for (pos, cell) in board.minefield().cells().iter() {
            let value = match (board.is_revealed(pos), cell) {
                (false, _) => UNREVEALED_INPUT,
                (true, Cell::Mine) => REVEALED_MINE_INPUT,
                (true, Cell::Count(n)) => f32::from(*n),
            };
            input.push(value);
        }
        #[expect(clippy::cast_precision_loss)]
        input.push(board.mines() as f32);
        input
    }
}

/// Picks the arg-max cell of `scores` that is still unrevealed on `board`.
///
/// Fails only when no scored cell is unrevealed.
pub(crate) fn select_unrevealed(
    scores: &[f32],
    board: &GameBoard,
) -> Result<Position, NoMoveAvailableError> {
    let mut best: Option<(Position, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        let pos = Position::from_index(index, board.cols());
        if board.is_revealed(pos) {
            continue;
        }
        let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((pos, score));
        }
    }
    best.map(|(pos, _)| pos).ok_or(NoMoveAvailableError)
}
