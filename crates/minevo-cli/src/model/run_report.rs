use chrono::{DateTime, Utc};
use minevo_policy::MoveStrategy;
use minevo_training::{config::SimulationConfig, scheduler::GenerationSummary};
use serde::Serialize;

/// Settings and per-generation outcomes of one training run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub trained_at: DateTime<Utc>,
    pub strategy: MoveStrategy,
    pub config: SimulationConfig,
    pub generations: Vec<GenerationSummary>,
}

impl RunReport {
    /// The generation with the most won boards; the earliest on ties.
    pub fn best_generation(&self) -> Option<&GenerationSummary> {
        self.generations
            .iter()
            .rev()
            .max_by_key(|summary| summary.won)
    }
}
