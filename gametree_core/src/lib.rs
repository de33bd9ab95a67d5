//! Depth and time bounded minimax search with alpha-beta pruning over any
//! two-player zero-sum game that implements [`engine::GameState`].

pub mod engine;
pub mod error;
pub mod games;

pub use engine::{choose_move, GameState, Ply, SearchConfig};
pub use error::{Error, Result};
