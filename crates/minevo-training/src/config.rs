use std::time::Duration;

use minevo_engine::{BoardConfig, BoardConfigError};
use serde::{Deserialize, Serialize};

use crate::weights::{CrossoverBlend, Perturbation};

/// Default share of cells that may hold mines.
pub const DEFAULT_MAX_MINE_DENSITY: f32 = 0.4;

/// Error returned when simulation settings are out of range.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum InvalidConfigurationError {
    #[display("invalid board: {_0}")]
    #[from]
    Board(BoardConfigError),
    #[display("population size must be at least {min}, got {size}")]
    PopulationTooSmall { size: usize, min: usize },
    #[display("mutation rate must be in [0, 1], got {rate}")]
    MutationRate { rate: f32 },
    #[display("perturbation scale must be finite and non-negative, got {perturbation:?}")]
    Perturbation { perturbation: Perturbation },
    #[display("mine density limit must be in (0, 1], got {density}")]
    MineDensityLimit { density: f32 },
    #[display("{mines} mines exceed the density limit of {max} for this board")]
    TooDense { mines: usize, max: usize },
}

/// Genetic operator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionParams {
    /// Probability of perturbing each weight element.
    pub mutation_rate: f32,
    pub perturbation: Perturbation,
    pub crossover: CrossoverBlend,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            mutation_rate: 0.1,
            perturbation: Perturbation::default(),
            crossover: CrossoverBlend::default(),
        }
    }
}

impl EvolutionParams {
    pub fn validate(&self) -> Result<(), InvalidConfigurationError> {
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(InvalidConfigurationError::MutationRate {
                rate: self.mutation_rate,
            });
        }
        if !self.perturbation.is_valid() {
            return Err(InvalidConfigurationError::Perturbation {
                perturbation: self.perturbation,
            });
        }
        Ok(())
    }
}

/// All settings for one simulation run.
///
/// Loadable from JSON; missing fields take their defaults:
///
/// ```
/// use minevo_training::config::SimulationConfig;
///
/// let config: SimulationConfig = serde_json::from_str(
///     r#"{ "board": { "rows": 8, "cols": 8, "mines": 10 }, "population_size": 30 }"#,
/// )
/// .unwrap();
/// config.validate_evolutionary().unwrap();
/// assert_eq!(config.evolution.mutation_rate, 0.1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub board: BoardConfig,
    /// Boards per generation.
    pub population_size: usize,
    pub evolution: EvolutionParams,
    /// Delay the driver waits between ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Seed for board layouts, network initialization and genetic operators.
    pub seed: Option<u64>,
    /// Largest allowed share of mine cells.
    pub max_mine_density: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            population_size: 20,
            evolution: EvolutionParams::default(),
            tick_interval_ms: 1000,
            seed: None,
            max_mine_density: DEFAULT_MAX_MINE_DENSITY,
        }
    }
}

impl SimulationConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Largest mine count the density limit allows on this board.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn max_mines(&self) -> usize {
        (self.board.cell_count() as f32 * self.max_mine_density).floor() as usize
    }

    /// Validates settings shared by every mode.
    pub fn validate_board(&self) -> Result<(), InvalidConfigurationError> {
        if !(self.max_mine_density > 0.0 && self.max_mine_density <= 1.0) {
            return Err(InvalidConfigurationError::MineDensityLimit {
                density: self.max_mine_density,
            });
        }
        let max = self.max_mines();
        if self.board.mines() > max {
            return Err(InvalidConfigurationError::TooDense {
                mines: self.board.mines(),
                max,
            });
        }
        Ok(())
    }

    /// Validates settings for a generational run.
    pub fn validate_evolutionary(&self) -> Result<(), InvalidConfigurationError> {
        self.validate_board()?;
        if self.population_size < 2 {
            return Err(InvalidConfigurationError::PopulationTooSmall {
                size: self.population_size,
                min: 2,
            });
        }
        self.evolution.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rows: usize, cols: usize, mines: usize) -> SimulationConfig {
        SimulationConfig {
            board: BoardConfig::new(rows, cols, mines).unwrap(),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        config.validate_evolutionary().unwrap();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.max_mines(), 40);
    }

    #[test]
    fn test_density_limit() {
        assert!(config(5, 5, 10).validate_board().is_ok());
        assert_eq!(
            config(5, 5, 11).validate_board(),
            Err(InvalidConfigurationError::TooDense { mines: 11, max: 10 })
        );

        let mut dense = config(2, 2, 3);
        dense.max_mine_density = 1.0;
        assert!(dense.validate_board().is_ok());
        dense.max_mine_density = 0.0;
        assert!(matches!(
            dense.validate_board(),
            Err(InvalidConfigurationError::MineDensityLimit { .. })
        ));
    }

    #[test]
    fn test_population_too_small() {
        let mut config = SimulationConfig {
            population_size: 1,
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate_evolutionary(),
            Err(InvalidConfigurationError::PopulationTooSmall { size: 1, min: 2 })
        );
        config.population_size = 2;
        assert!(config.validate_evolutionary().is_ok());
    }

    #[test]
    fn test_evolution_params() {
        let mut params = EvolutionParams {
            mutation_rate: 1.5,
            ..EvolutionParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(InvalidConfigurationError::MutationRate { .. })
        ));
        params.mutation_rate = 0.2;
        params.perturbation = Perturbation::Gaussian { sigma: -1.0 };
        assert!(matches!(
            params.validate(),
            Err(InvalidConfigurationError::Perturbation { .. })
        ));
    }

    #[test]
    fn test_json_overrides() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{
                "population_size": 4,
                "evolution": {
                    "crossover": "complementary",
                    "perturbation": { "kind": "gaussian", "sigma": 0.02 }
                },
                "seed": 17
            }"#,
        )
        .unwrap();
        assert_eq!(config.population_size, 4);
        assert_eq!(config.seed, Some(17));
        assert_eq!(config.board, BoardConfig::default());
        assert_eq!(config.evolution.crossover, CrossoverBlend::Complementary);
        assert_eq!(
            config.evolution.perturbation,
            Perturbation::Gaussian { sigma: 0.02 }
        );
        assert_eq!(config.evolution.mutation_rate, 0.1);
    }

    #[test]
    fn test_json_rejects_invalid_board() {
        let result = serde_json::from_str::<SimulationConfig>(
            r#"{ "board": { "rows": 3, "cols": 3, "mines": 9 } }"#,
        );
        assert!(result.is_err());
    }
}
