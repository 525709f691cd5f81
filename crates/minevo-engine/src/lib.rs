//! Game-state engine for the mine-clearing puzzle.
//!
//! - [`core`] holds the plain data: [`Position`], [`Cell`], the generic [`Grid`]
//!   and the immutable [`Minefield`] layout.
//! - [`engine`] holds the play logic: [`BoardConfig`] validation, [`GameBoard`]
//!   with reveal/flag/win-loss rules, and read-only [`BoardSnapshot`]s for
//!   renderers.
//!
//! Boards own all of their state; nothing is shared between boards, so any
//! number of them can be stepped in any order.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
