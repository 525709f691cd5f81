use std::{path::PathBuf, thread};

use anyhow::Context as _;
use chrono::Utc;
use minevo_engine::{GameBoard, RevealOutcome};
use minevo_policy::{MoveStrategy, network::CpuBackend};
use minevo_training::{config::SimulationConfig, genetic::Agent, scheduler::SimulationScheduler};

use crate::{
    command::{BoardArg, StrategyArg},
    model::recording::GameRecording,
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// How moves are chosen (`random` or `policy`)
    #[arg(long, default_value = "policy")]
    strategy: StrategyArg,
    #[command(flatten)]
    board: BoardArg,
    /// Delay between moves in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
    /// Seed for the board layout and the network weights
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many moves
    #[arg(long)]
    step: Option<usize>,
    /// Save every board state to this JSON file
    #[arg(long)]
    record: Option<PathBuf>,
}

impl Default for PlayArg {
    fn default() -> Self {
        Self {
            strategy: StrategyArg::Policy,
            board: BoardArg::default(),
            interval_ms: 1000,
            seed: None,
            step: None,
            record: None,
        }
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        strategy,
        board,
        interval_ms,
        seed,
        step,
        record,
    } = arg;

    let defaults = SimulationConfig::default();
    let config = SimulationConfig {
        board: board.apply(defaults.board)?,
        tick_interval_ms: *interval_ms,
        seed: *seed,
        ..defaults
    };
    let strategy = MoveStrategy::from(*strategy);
    let mut scheduler = SimulationScheduler::manual(config.clone(), strategy, CpuBackend::new())?;

    eprintln!(
        "Playing a {}x{} board with {} mines ({strategy})",
        config.board.rows(),
        config.board.cols(),
        config.board.mines(),
    );
    let mut snapshots = vec![current_board(&scheduler)?.snapshot()];
    println!("{}", snapshots[0]);

    let mut moves = 0;
    while step.is_none_or(|limit| moves < limit) && !scheduler.is_generation_complete() {
        if moves > 0 {
            thread::sleep(config.tick_interval());
        }
        let (pos, outcome) = match scheduler.step_board(0) {
            Ok(step) => step,
            Err(e) => {
                eprintln!("Board stopped: {e}");
                break;
            }
        };
        moves += 1;
        let snapshot = current_board(&scheduler)?.snapshot();
        println!("Move #{moves}: {pos} {}", describe(outcome));
        println!("{snapshot}");
        snapshots.push(snapshot);
    }

    let board = current_board(&scheduler)?;
    eprintln!("Status: {:?}", board.status());
    eprintln!("Fitness: {}", board.fitness());
    eprintln!(
        "Revealed: {}/{} safe cells",
        board.revealed_safe_cells(),
        board.minefield().safe_cells()
    );
    eprintln!(
        "Moves: {}",
        board
            .moves_played()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    );

    if let Some(path) = record {
        let recording = GameRecording {
            recorded_at: Utc::now(),
            board: config.board,
            strategy,
            seed: *seed,
            snapshots,
        };
        Output::save_json(&recording, Some(path.as_path()))?;
        eprintln!("Recording saved to {}", path.display());
    }

    Ok(())
}

fn current_board(scheduler: &SimulationScheduler) -> anyhow::Result<&GameBoard> {
    scheduler
        .population()
        .iter()
        .next()
        .map(Agent::board)
        .context("No board in play")
}

fn describe(outcome: RevealOutcome) -> String {
    match outcome {
        RevealOutcome::Ignored => "ignored".to_owned(),
        RevealOutcome::Revealed { cells: 1 } => "revealed 1 cell".to_owned(),
        RevealOutcome::Revealed { cells } => format!("revealed {cells} cells"),
        RevealOutcome::Exploded => "hit a mine".to_owned(),
    }
}
