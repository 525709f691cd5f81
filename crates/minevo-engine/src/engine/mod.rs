//! Board configuration and play logic.
//!
//! - [`BoardConfig`] - Validated dimensions and mine count
//! - [`GameBoard`] - One puzzle instance with reveal, flag, and win/loss rules
//! - [`BoardSnapshot`] - Detached copy of the play state for rendering
//!
//! # Game Flow
//!
//! 1. Validate a [`BoardConfig`]
//! 2. Generate a [`GameBoard`] (random or seeded layout)
//! 3. Call [`GameBoard::reveal`] / [`GameBoard::toggle_flag`] until
//!    [`GameBoard::is_terminal`]
//!
//! ```
//! use minevo_engine::{BoardConfig, GameBoard, Position};
//!
//! let config = BoardConfig::new(9, 9, 10).unwrap();
//! let mut board = GameBoard::new(config);
//!
//! board.reveal(Position::new(4, 4));
//! if board.status().is_lost() {
//!     println!("Game over!");
//! }
//! ```

pub use self::{board_config::*, game_board::*, snapshot::*};

mod board_config;
mod game_board;
mod snapshot;
