pub use self::{cell::*, grid::*, minefield::*, position::*};

pub(crate) mod cell;
pub(crate) mod grid;
pub(crate) mod minefield;
pub(crate) mod position;
