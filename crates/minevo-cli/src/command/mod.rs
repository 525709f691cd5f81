use anyhow::Context as _;
use clap::{Parser, Subcommand};
use minevo_engine::BoardConfig;
use minevo_policy::MoveStrategy;

use self::{play::PlayArg, train::TrainArg};

mod play;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play a single board move by move
    Play(#[clap(flatten)] PlayArg),
    /// Evolve policy networks over generations of boards
    Train(#[clap(flatten)] TrainArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Play(PlayArg::default())) {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Train(arg) => train::run(&arg)?,
    }
    Ok(())
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
enum StrategyArg {
    Random,
    #[default]
    Policy,
}

impl From<StrategyArg> for MoveStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Random => MoveStrategy::RandomSearch,
            StrategyArg::Policy => MoveStrategy::PolicyDriven,
        }
    }
}

/// Board size options shared by every mode.
#[derive(Default, Debug, Clone, clap::Args)]
struct BoardArg {
    /// Number of rows
    #[arg(long)]
    rows: Option<usize>,
    /// Number of columns
    #[arg(long)]
    cols: Option<usize>,
    /// Number of mines
    #[arg(long)]
    mines: Option<usize>,
}

impl BoardArg {
    /// Overrides the dimensions of `base` with the given options.
    fn apply(&self, base: BoardConfig) -> anyhow::Result<BoardConfig> {
        let rows = self.rows.unwrap_or(base.rows());
        let cols = self.cols.unwrap_or(base.cols());
        let mines = self.mines.unwrap_or(base.mines());
        BoardConfig::new(rows, cols, mines)
            .with_context(|| format!("Invalid board: {rows}x{cols} with {mines} mines"))
    }
}
