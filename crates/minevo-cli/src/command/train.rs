use std::{path::PathBuf, thread};

use chrono::Utc;
use minevo_policy::{
    MoveStrategy,
    network::{CpuBackend, NetworkBackend as _},
};
use minevo_training::{
    config::SimulationConfig,
    scheduler::{GenerationSummary, SimulationScheduler, TickOutcome},
    weights::CrossoverBlend,
};

use crate::{
    command::{BoardArg, StrategyArg},
    model::run_report::RunReport,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Simulation settings file (JSON); options below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Boards per generation
    #[arg(long)]
    population: Option<usize>,
    /// Number of generations to play
    #[arg(long, default_value_t = 10)]
    generations: usize,
    #[command(flatten)]
    board: BoardArg,
    /// Probability of perturbing each weight
    #[arg(long)]
    mutation_rate: Option<f32>,
    /// Blend parents with weights that sum to one
    #[arg(long)]
    complementary_crossover: bool,
    /// How moves are chosen (`random` or `policy`)
    #[arg(long, default_value = "policy")]
    strategy: StrategyArg,
    /// Delay between ticks in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Seed for boards, network weights and genetic operators
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path for the run report
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn load_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config: SimulationConfig = match &self.config {
            Some(path) => {
                log::info!("Loading simulation settings from {}", path.display());
                util::read_json_file("simulation config", path)?
            }
            None => SimulationConfig::default(),
        };
        config.board = self.board.apply(config.board)?;
        if let Some(size) = self.population {
            config.population_size = size;
        }
        if let Some(rate) = self.mutation_rate {
            config.evolution.mutation_rate = rate;
        }
        if self.complementary_crossover {
            config.evolution.crossover = CrossoverBlend::Complementary;
        }
        if let Some(ms) = self.interval_ms {
            config.tick_interval_ms = ms;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.load_config()?;
    let strategy = MoveStrategy::from(arg.strategy);
    let mut scheduler =
        SimulationScheduler::evolutionary(config.clone(), strategy, CpuBackend::new())?;
    let interval = config.tick_interval();
    let started_at = Utc::now();

    eprintln!(
        "Training {} boards of {}x{} with {} mines for {} generations ({strategy})",
        config.population_size,
        config.board.rows(),
        config.board.cols(),
        config.board.mines(),
        arg.generations,
    );

    while scheduler.history().len() < arg.generations {
        match scheduler.tick() {
            TickOutcome::GenerationComplete(summary) => print_summary(&summary),
            TickOutcome::Halted => {
                anyhow::bail!(
                    "Evolution halted after generation #{}",
                    scheduler.population().generation()
                );
            }
            TickOutcome::Stepped { .. } | TickOutcome::Evolved { .. } | TickOutcome::Idle => {}
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    let report = RunReport {
        started_at,
        trained_at: Utc::now(),
        strategy,
        config,
        generations: scheduler.history().to_vec(),
    };

    eprintln!();
    eprintln!("Training completed");
    if let Some(best) = report.best_generation() {
        eprintln!(
            "  Best generation: #{} ({}/{} won)",
            best.generation, best.won, best.population_size
        );
    }
    eprintln!(
        "  Live weight tensors: {}",
        scheduler.backend().live_tensors()
    );

    Output::save_json(&report, arg.output.as_deref())?;
    if let Some(path) = &arg.output {
        eprintln!("  Report saved to {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &GenerationSummary) {
    eprintln!("Generation #{}:", summary.generation);
    eprintln!("  Won:  {}/{}", summary.won, summary.population_size);
    eprintln!("  Lost: {}", summary.lost);
    if summary.unfinished > 0 {
        eprintln!("  Unfinished: {}", summary.unfinished);
    }
    eprintln!("  Fitness Stats:");
    eprintln!("    Min:  {:.3}", summary.fitness.min);
    eprintln!("    Max:  {:.3}", summary.fitness.max);
    eprintln!("    Mean: {:.3}", summary.fitness.mean);
}
