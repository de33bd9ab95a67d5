//! Game rules shipped with the engine. Each game implements
//! [`GameState`](crate::engine::GameState) and provides an evaluator.

pub mod othello;
pub mod tictactoe;
pub mod ultimate;
