//! Tick-driven simulation loop.
//!
//! [`SimulationScheduler`] owns a [`Population`] and advances it one tick at a
//! time. The driver decides how often to call [`tick`](SimulationScheduler::tick);
//! stopping between ticks is always safe.
//!
//! ```text
//! Stepping ──(no active boards)──> Evolving ──(evolve ok)──> Stepping (generation + 1)
//!     │                               │
//!     │ manual mode                   └──(evolve failed)──> Halted
//!     └──────────────> Finished
//! ```

use std::{fmt, mem};

use log::{debug, error, info, trace, warn};
use minevo_engine::{GameBoard, GameStatus, Position, RevealOutcome};
use minevo_policy::{
    MoveStrategy,
    network::{CpuBackend, NetworkBackend},
};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    InvalidConfigurationError, SimulationError,
    config::SimulationConfig,
    genetic::{Agent, EvolutionEngine, Population},
};

/// Whether finished generations are bred into new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SchedulerMode {
    /// A population of boards evolves generation after generation.
    Evolutionary,
    /// A single board is played; nothing is bred when it ends.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SchedulerPhase {
    /// Boards receive moves.
    Stepping,
    /// Every board finished; the next tick breeds a new generation.
    Evolving,
    /// Manual mode: the board finished.
    Finished,
    /// Evolution failed; no further ticks have any effect.
    Halted,
}

/// Result of one [`SimulationScheduler::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Active boards received `moves` moves and `retired` of them finished.
    Stepped { moves: usize, retired: usize },
    /// The last active board finished.
    GenerationComplete(GenerationSummary),
    /// A new generation started.
    Evolved { generation: usize },
    /// Nothing left to do until the board is reset.
    Idle,
    Halted,
}

/// Minimum, mean and maximum of a set of fitness values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessStats {
    pub min: f32,
    pub mean: f32,
    pub max: f32,
}

impl FitnessStats {
    /// Returns `None` for an empty set.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut count: usize = 0;
        let mut sum = 0.0;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Self {
            min,
            mean: sum / count as f32,
            max,
        })
    }
}

/// Outcome counts of one finished generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub population_size: usize,
    pub won: usize,
    pub lost: usize,
    /// Boards retired without reaching a terminal state.
    pub unfinished: usize,
    /// Raw fitness, before normalization.
    pub fitness: FitnessStats,
}

impl GenerationSummary {
    #[must_use]
    pub fn from_population(population: &Population) -> Self {
        let mut summary = Self {
            generation: population.generation(),
            population_size: population.size(),
            won: 0,
            lost: 0,
            unfinished: 0,
            fitness: FitnessStats::from_values(population.iter().map(|a| a.board().fitness()))
                .unwrap_or_default(),
        };
        for agent in population.iter() {
            match agent.board().status() {
                GameStatus::Won => summary.won += 1,
                GameStatus::Lost => summary.lost += 1,
                GameStatus::InProgress => summary.unfinished += 1,
            }
        }
        summary
    }
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: {}/{} won, {} lost, fitness max {:.1} mean {:.1}",
            self.generation,
            self.won,
            self.population_size,
            self.lost,
            self.fitness.max,
            self.fitness.mean,
        )
    }
}

/// Drives boards, detects generation completion and triggers evolution.
#[derive(Debug)]
pub struct SimulationScheduler<B = CpuBackend> {
    config: SimulationConfig,
    mode: SchedulerMode,
    strategy: MoveStrategy,
    backend: B,
    engine: EvolutionEngine,
    population: Population,
    phase: SchedulerPhase,
    history: Vec<GenerationSummary>,
    rng: Pcg32,
}

impl<B> SimulationScheduler<B>
where
    B: NetworkBackend,
{
    /// Creates a scheduler that evolves `config.population_size` boards.
    pub fn evolutionary(
        config: SimulationConfig,
        strategy: MoveStrategy,
        backend: B,
    ) -> Result<Self, InvalidConfigurationError> {
        config.validate_evolutionary()?;
        Ok(Self::start(config, SchedulerMode::Evolutionary, strategy, backend))
    }

    /// Creates a scheduler for a single board played without evolution.
    pub fn manual(
        config: SimulationConfig,
        strategy: MoveStrategy,
        backend: B,
    ) -> Result<Self, InvalidConfigurationError> {
        config.validate_board()?;
        Ok(Self::start(config, SchedulerMode::Manual, strategy, backend))
    }

    fn start(
        config: SimulationConfig,
        mode: SchedulerMode,
        strategy: MoveStrategy,
        backend: B,
    ) -> Self {
        let mut rng = config
            .seed
            .map_or_else(Pcg32::from_os_rng, Pcg32::seed_from_u64);
        let size = match mode {
            SchedulerMode::Evolutionary => config.population_size,
            SchedulerMode::Manual => 1,
        };
        let population = Population::random(&backend, config.board, size, &mut rng);
        debug!(
            "{mode:?} scheduler: {size} boards of {}x{} with {} mines, {strategy} moves",
            config.board.rows(),
            config.board.cols(),
            config.board.mines(),
        );
        Self {
            engine: EvolutionEngine::new(config.evolution),
            config,
            mode,
            strategy,
            backend,
            population,
            phase: SchedulerPhase::Stepping,
            history: Vec::new(),
            rng,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> SchedulerMode {
        self.mode
    }

    #[must_use]
    pub fn strategy(&self) -> MoveStrategy {
        self.strategy
    }

    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Summaries of every completed generation, oldest first.
    #[must_use]
    pub fn history(&self) -> &[GenerationSummary] {
        &self.history
    }

    /// Returns `true` once every board of the current generation is finished.
    #[must_use]
    pub fn is_generation_complete(&self) -> bool {
        self.population.is_complete()
    }

    /// Advances the simulation by one step of the current phase.
    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            SchedulerPhase::Stepping => self.step_all(),
            SchedulerPhase::Evolving => self.evolve(),
            SchedulerPhase::Finished => TickOutcome::Idle,
            SchedulerPhase::Halted => TickOutcome::Halted,
        }
    }

    /// Plays exactly one move on the active board at `index`.
    ///
    /// # Errors
    ///
    /// Fails if the scheduler is not stepping, if there is no active board at
    /// `index`, or if the strategy has no move for it. In the last case the
    /// board is retired.
    pub fn step_board(
        &mut self,
        index: usize,
    ) -> Result<(Position, RevealOutcome), SimulationError> {
        if !self.phase.is_stepping() {
            return Err(SimulationError::NotStepping { phase: self.phase });
        }
        let active = self.population.active().len();
        let agent = self
            .population
            .active_mut()
            .get_mut(index)
            .ok_or(SimulationError::NoActiveBoard { index, active })?;
        let result = agent.step(self.strategy, &mut self.rng);
        match &result {
            Ok(_) => self.population.retire_finished(&[]),
            Err(e) => {
                warn!("board {index} halted: {e}");
                self.population.retire_finished(&[index])
            }
        };
        if self.population.is_complete() {
            self.complete_generation();
        }
        result.map_err(SimulationError::from)
    }

    /// Discards every board, network and generation summary and starts over
    /// at generation 1.
    pub fn reset(&mut self) {
        let size = match self.mode {
            SchedulerMode::Evolutionary => self.config.population_size,
            SchedulerMode::Manual => 1,
        };
        let population = Population::random(&self.backend, self.config.board, size, &mut self.rng);
        mem::replace(&mut self.population, population).dispose();
        self.history.clear();
        self.phase = SchedulerPhase::Stepping;
        debug!("reset: {} live weight tensors", self.backend.live_tensors());
    }

    fn step_all(&mut self) -> TickOutcome {
        let mut moves = 0;
        let mut halted = Vec::new();
        for (i, agent) in self.population.active_mut().iter_mut().enumerate() {
            match agent.step(self.strategy, &mut self.rng) {
                Ok((pos, outcome)) => {
                    moves += 1;
                    trace!("board {i}: {pos} -> {outcome:?}");
                }
                Err(e) => {
                    warn!("board {i} halted: {e}");
                    halted.push(i);
                }
            }
        }
        let retired = self.population.retire_finished(&halted);
        if self.population.is_complete() {
            return TickOutcome::GenerationComplete(self.complete_generation());
        }
        TickOutcome::Stepped { moves, retired }
    }

    fn complete_generation(&mut self) -> GenerationSummary {
        let summary = GenerationSummary::from_population(&self.population);
        info!("{summary}");
        self.history.push(summary.clone());
        self.phase = match self.mode {
            SchedulerMode::Evolutionary => SchedulerPhase::Evolving,
            SchedulerMode::Manual => SchedulerPhase::Finished,
        };
        summary
    }

    fn evolve(&mut self) -> TickOutcome {
        let generation = self.population.generation();
        let policies = match self.engine.evolve(
            &mut self.population,
            self.config.population_size,
            &self.backend,
            &mut self.rng,
        ) {
            Ok(policies) => policies,
            Err(e) => {
                error!("evolution of generation {generation} failed: {e}");
                self.phase = SchedulerPhase::Halted;
                return TickOutcome::Halted;
            }
        };

        let board = self.config.board;
        let rng = &mut self.rng;
        let agents = policies
            .into_iter()
            .map(|policy| Agent::new(GameBoard::with_rng(board, rng), policy))
            .collect();
        self.population.advance(agents);
        self.phase = SchedulerPhase::Stepping;

        let generation = self.population.generation();
        debug!(
            "generation {generation} started with {} live weight tensors",
            self.backend.live_tensors()
        );
        TickOutcome::Evolved { generation }
    }
}
