//! Neuro-evolution of mine-clearing agents.
//!
//! Each generation, a population of boards is played move by move, one board
//! per policy network. When every board has finished, the networks are bred
//! into the next generation according to how much of their board they
//! uncovered.
//!
//! # Generation Cycle
//!
//! 1. **Stepping** - Every active board receives one move per tick from its
//!    [`MoveStrategy`](minevo_policy::MoveStrategy)
//! 2. **Retirement** - Won, lost and stuck boards move to the finished set
//! 3. **Summary** - Once no board is active, a [`GenerationSummary`] is recorded
//! 4. **Evolution** - [`EvolutionEngine`] breeds the finished networks into a
//!    new population bound to fresh boards
//!
//! # Architecture
//!
//! ```text
//! SimulationScheduler (tick loop, phase machine)
//!     ↓ steps
//! Population (active / finished agents)
//!     ↓ at generation boundary
//! EvolutionEngine (normalize, rank, crossover, mutate)
//!     ↓ uses
//! weights (blend crossover, mutation noise)
//! ```
//!
//! # Example
//!
//! ```
//! use minevo_engine::BoardConfig;
//! use minevo_policy::{MoveStrategy, network::CpuBackend};
//! use minevo_training::{
//!     config::SimulationConfig,
//!     scheduler::{SimulationScheduler, TickOutcome},
//! };
//!
//! let config = SimulationConfig {
//!     board: BoardConfig::new(5, 5, 3).unwrap(),
//!     population_size: 4,
//!     seed: Some(42),
//!     ..SimulationConfig::default()
//! };
//! let mut scheduler =
//!     SimulationScheduler::evolutionary(config, MoveStrategy::PolicyDriven, CpuBackend::new())
//!         .unwrap();
//!
//! while scheduler.population().generation() < 3 {
//!     if let TickOutcome::Halted = scheduler.tick() {
//!         break;
//!     }
//! }
//! assert_eq!(scheduler.history().len(), 2);
//! ```
//!
//! [`GenerationSummary`]: scheduler::GenerationSummary
//! [`EvolutionEngine`]: genetic::EvolutionEngine

use minevo_policy::{NoMoveAvailableError, WeightShapeError};

use crate::scheduler::SchedulerPhase;

pub mod config;
pub mod genetic;
pub mod scheduler;
pub mod weights;

pub use self::config::InvalidConfigurationError;

/// Error returned when a population cannot be evolved.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum InvalidPopulationStateError {
    #[display("target population size must be at least 2, got {target_size}")]
    TargetTooSmall { target_size: usize },
    #[display("no finished boards to breed from")]
    EmptyPopulation,
    #[display("{active} boards are still in play")]
    ActiveBoardsRemain { active: usize },
    #[display("finished boards have different dimensions")]
    MixedBoardConfigs,
    #[display("child weights do not fit the network: {_0}")]
    #[from]
    IncompatibleWeights(WeightShapeError),
}

/// Any error a simulation can report.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SimulationError {
    #[from]
    InvalidConfiguration(InvalidConfigurationError),
    #[from]
    NoMoveAvailable(NoMoveAvailableError),
    #[from]
    InvalidPopulationState(InvalidPopulationStateError),
    #[display("boards only accept moves while stepping, scheduler is {phase:?}")]
    NotStepping { phase: SchedulerPhase },
    #[display("no active board at index {index} ({active} active)")]
    NoActiveBoard { index: usize, active: usize },
}
