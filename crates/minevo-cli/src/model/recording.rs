use chrono::{DateTime, Utc};
use minevo_engine::{BoardConfig, BoardSnapshot};
use minevo_policy::MoveStrategy;
use serde::Serialize;

/// Every state a single board went through, starting before the first move.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecording {
    pub recorded_at: DateTime<Utc>,
    pub board: BoardConfig,
    pub strategy: MoveStrategy,
    pub seed: Option<u64>,
    pub snapshots: Vec<BoardSnapshot>,
}
