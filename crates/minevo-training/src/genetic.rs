//! Population bookkeeping and the generational breeding step.
//!
//! # Key Components
//!
//! - [`Agent`] - One board paired with the policy network that plays it
//! - [`Population`] - Active and finished agents of one generation
//! - [`EvolutionEngine`] - Turns a finished population into the next
//!   generation's policy networks
//!
//! # Evolution Step
//!
//! 1. **Normalize** - Each finished board's fitness is divided by the
//!    population total (skipped when the total is zero)
//! 2. **Rank** - Agents are sorted by fitness, best first
//! 3. **Breeding pool** - The top `ceil(target_size / 2)` agents become parents
//! 4. **Reproduction** - Parents are drawn uniformly with replacement, blended
//!    with [`blend_crossover`] and perturbed with [`mutate`]
//! 5. **Release** - Every finished agent's network is disposed
//!
//! There is no elitism: every network of the next generation is a child.

use std::mem;

use log::debug;
use minevo_engine::{BoardConfig, GameBoard, Position, RevealOutcome};
use minevo_policy::{MoveStrategy, NoMoveAvailableError, PolicyNetwork, network::NetworkBackend};
use rand::Rng;

use crate::{
    InvalidPopulationStateError,
    config::EvolutionParams,
    weights::{blend_crossover, mutate},
};

/// A board together with the network that chooses its moves.
#[derive(Debug)]
pub struct Agent {
    board: GameBoard,
    policy: PolicyNetwork,
}

impl Agent {
    /// # Panics
    ///
    /// Panics if the policy was built for a board of another size.
    #[must_use]
    pub fn new(board: GameBoard, policy: PolicyNetwork) -> Self {
        let config = policy.config();
        assert_eq!(
            (board.rows(), board.cols()),
            (config.rows(), config.cols()),
            "policy does not fit the board"
        );
        Self { board, policy }
    }

    /// Creates an agent with a random board and a randomly initialized policy.
    pub fn random<B, R>(backend: &B, config: BoardConfig, rng: &mut R) -> Self
    where
        B: NetworkBackend + ?Sized,
        R: Rng,
    {
        let board = GameBoard::with_rng(config, rng);
        let policy = PolicyNetwork::random(backend, config, rng);
        Self { board, policy }
    }

    #[must_use]
    pub fn board(&self) -> &GameBoard {
        &self.board
    }

    #[must_use]
    pub fn policy(&self) -> &PolicyNetwork {
        &self.policy
    }

    /// Asks `strategy` for a move and applies it to the board.
    pub fn step<R>(
        &mut self,
        strategy: MoveStrategy,
        rng: &mut R,
    ) -> Result<(Position, RevealOutcome), NoMoveAvailableError>
    where
        R: Rng + ?Sized,
    {
        let pos = strategy.select_move(&self.board, &self.policy, rng)?;
        Ok((pos, self.board.reveal(pos)))
    }

    /// Releases the agent's network.
    pub fn dispose(self) {
        self.policy.dispose();
    }
}

/// All agents of one generation.
///
/// Agents start in the active set and move to the finished set once their
/// board is terminal or their strategy can no longer move. Until the
/// generation boundary, `active + finished` always equals [`size`](Self::size).
#[derive(Debug)]
pub struct Population {
    active: Vec<Agent>,
    finished: Vec<Agent>,
    generation: usize,
    size: usize,
}

impl Population {
    /// Starts generation 1 with every agent active.
    #[must_use]
    pub fn new(agents: Vec<Agent>) -> Self {
        Self {
            size: agents.len(),
            active: agents,
            finished: Vec::new(),
            generation: 1,
        }
    }

    /// Starts generation 1 with `size` random agents.
    pub fn random<B, R>(backend: &B, config: BoardConfig, size: usize, rng: &mut R) -> Self
    where
        B: NetworkBackend + ?Sized,
        R: Rng,
    {
        Self::new((0..size).map(|_| Agent::random(backend, config, rng)).collect())
    }

    #[must_use]
    pub fn active(&self) -> &[Agent] {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut [Agent] {
        &mut self.active
    }

    #[must_use]
    pub fn finished(&self) -> &[Agent] {
        &self.finished
    }

    /// Active agents followed by finished ones.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.active.iter().chain(&self.finished)
    }

    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` once no agent is active.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.active.is_empty()
    }

    /// Moves terminal agents, and the active agents at `halted` indices, to
    /// the finished set. Returns how many moved.
    pub fn retire_finished(&mut self, halted: &[usize]) -> usize {
        let before = self.finished.len();
        for (i, agent) in mem::take(&mut self.active).into_iter().enumerate() {
            if agent.board.is_terminal() || halted.contains(&i) {
                self.finished.push(agent);
            } else {
                self.active.push(agent);
            }
        }
        self.finished.len() - before
    }

    fn take_finished(&mut self) -> Vec<Agent> {
        mem::take(&mut self.finished)
    }

    /// Starts the next generation with `agents`.
    ///
    /// # Panics
    ///
    /// Panics if the current generation still has active agents.
    pub fn advance(&mut self, agents: Vec<Agent>) {
        assert!(self.is_complete(), "generation is still running");
        for agent in self.take_finished() {
            agent.dispose();
        }
        self.size = agents.len();
        self.active = agents;
        self.generation += 1;
    }

    /// Releases every agent's network.
    pub fn dispose(self) {
        for agent in self.active.into_iter().chain(self.finished) {
            agent.dispose();
        }
    }
}

/// Genetic operators applied at each generation boundary.
#[derive(Debug, Clone, Default)]
pub struct EvolutionEngine {
    params: EvolutionParams,
}

impl EvolutionEngine {
    #[must_use]
    pub fn new(params: EvolutionParams) -> Self {
        Self { params }
    }

    /// Breeds `target_size` policy networks from the finished agents of
    /// `population`.
    ///
    /// # Arguments
    ///
    /// * `population` - A generation whose boards have all finished
    /// * `target_size` - Number of children to breed (at least 2)
    /// * `backend` - Backend the children's networks are built on
    /// * `rng` - Random number generator for parent draws, crossover and mutation
    ///
    /// # Errors
    ///
    /// Fails if `target_size` is below 2, if boards are still in play, if
    /// nothing finished, or if the finished boards differ in size. On error
    /// the population is left as it was, apart from fitness normalization.
    ///
    /// # Returns
    ///
    /// `target_size` child networks. The finished agents' networks are
    /// disposed and the finished set is empty.
    pub fn evolve<B, R>(
        &self,
        population: &mut Population,
        target_size: usize,
        backend: &B,
        rng: &mut R,
    ) -> Result<Vec<PolicyNetwork>, InvalidPopulationStateError>
    where
        B: NetworkBackend + ?Sized,
        R: Rng + ?Sized,
    {
        if target_size < 2 {
            return Err(InvalidPopulationStateError::TargetTooSmall { target_size });
        }
        if !population.is_complete() {
            return Err(InvalidPopulationStateError::ActiveBoardsRemain {
                active: population.active.len(),
            });
        }
        let finished = &mut population.finished;
        let Some(config) = finished.first().map(|agent| agent.policy.config()) else {
            return Err(InvalidPopulationStateError::EmptyPopulation);
        };
        if finished.iter().any(|agent| agent.policy.config() != config) {
            return Err(InvalidPopulationStateError::MixedBoardConfigs);
        }

        normalize_fitness(finished);
        let parents: Vec<_> = breeding_pool(finished, target_size)
            .into_iter()
            .map(|i| finished[i].policy.clone_weights())
            .collect();
        debug!(
            "generation {}: breeding {target_size} children from {} parents",
            population.generation,
            parents.len()
        );

        let mut children = Vec::with_capacity(target_size);
        for _ in 0..target_size {
            let a = &parents[rng.random_range(0..parents.len())];
            let b = &parents[rng.random_range(0..parents.len())];
            let mut weights = blend_crossover(a, b, self.params.crossover, rng);
            mutate(
                &mut weights,
                self.params.mutation_rate,
                self.params.perturbation,
                rng,
            );
            children.push(PolicyNetwork::from_weights(backend, config, weights)?);
        }

        for agent in population.take_finished() {
            agent.dispose();
        }
        Ok(children)
    }
}

fn normalize_fitness(agents: &mut [Agent]) {
    let total: f32 = agents.iter().map(|agent| agent.board.fitness()).sum();
    for agent in agents {
        agent.board.normalize_fitness(total);
    }
}

/// Indices of the `ceil(target_size / 2)` fittest agents, best first.
/// Equal fitness keeps insertion order.
fn breeding_pool(agents: &[Agent], target_size: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..agents.len()).collect();
    ranked.sort_by(|&a, &b| {
        agents[b]
            .board
            .fitness()
            .total_cmp(&agents[a].board.fitness())
    });
    ranked.truncate(target_size.div_ceil(2));
    ranked
}
