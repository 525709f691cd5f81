//! Move selection for mine-clearing agents.
//!
//! This crate turns a board's visible state into a move:
//!
//! - [`tensor`] - Dense `f32` tensors and the live-tensor gauge
//! - [`network`] - Feed-forward network capability ([`NetworkBackend`],
//!   [`FeedForward`]) and its CPU implementation
//! - [`PolicyNetwork`] - Fixed-topology policy: board encoding, scoring,
//!   greedy move choice with revealed-cell masking
//! - [`MoveStrategy`] - Random search or policy-driven selection
//!
//! # Architecture
//!
//! ```text
//! MoveStrategy
//!     ↓ PolicyDriven delegates to
//! PolicyNetwork (board encoding, masking)
//!     ↓ evaluates
//! FeedForward (DenseNetwork from CpuBackend)
//! ```
//!
//! # Example
//!
//! ```
//! use minevo_engine::{BoardConfig, GameBoard};
//! use minevo_policy::{MoveStrategy, PolicyNetwork, network::CpuBackend};
//!
//! let config = BoardConfig::new(8, 8, 10).unwrap();
//! let mut rng = rand::rng();
//! let backend = CpuBackend::new();
//!
//! let mut board = GameBoard::new(config);
//! let policy = PolicyNetwork::random(&backend, config, &mut rng);
//!
//! while !board.is_terminal() {
//!     let pos = MoveStrategy::PolicyDriven
//!         .select_move(&board, &policy, &mut rng)
//!         .unwrap();
//!     board.reveal(pos);
//! }
//! ```

pub use self::{move_strategy::*, policy_network::*};

mod move_strategy;
pub mod network;
mod policy_network;
pub mod tensor;

/// Error returned when a strategy is asked to move on a board with no
/// unrevealed cells left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("no unrevealed cell available to move on")]
pub struct NoMoveAvailableError;

/// Error returned when weight tensors do not match a network's topology.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum WeightShapeError {
    #[display("expected {expected} weight tensors, got {actual}")]
    TensorCount { expected: usize, actual: usize },
    #[display("weight tensor {index} has shape {actual:?}, expected {expected:?}")]
    TensorShape {
        index: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}
