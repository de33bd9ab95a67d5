use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

pub mod config;
pub mod eval;
pub mod minimax;
pub mod node;
pub mod ordering;
pub mod search;

#[cfg(test)]
mod bench_test;

pub use config::{OrderingPolicy, SearchConfig, TieBreak};
pub use eval::EvalCache;
pub use minimax::MinimaxEngine;
pub use node::Node;
pub use ordering::MoveOrderer;
pub use search::AlphaBetaEngine;

pub type Score = i32;

/// Bound sentinel for alpha-beta windows. Every game's `MAX_UTILITY` must be
/// strictly smaller.
pub const INFINITY: Score = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome<P> {
    Win(P),
    Draw,
}

/// The edge between a node and its parent: a real move, or the synthetic
/// forced pass used when the player to move has no legal move.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ply<M> {
    Move(M),
    Pass,
}

impl<M> Ply<M> {
    pub const fn as_move(&self) -> Option<&M> {
        match self {
            Self::Move(mv) => Some(mv),
            Self::Pass => None,
        }
    }
}

impl<M: fmt::Display> fmt::Display for Ply<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move(mv) => write!(f, "{mv}"),
            Self::Pass => f.write_str("pass"),
        }
    }
}

/// Rules of a two-player zero-sum game, implemented once per game.
///
/// States are immutable values: `apply_move` and `pass` return new states.
/// The `Hash + Eq` implementation must reflect the full position, since the
/// engine uses the state itself as its heuristic cache key.
pub trait GameState: Clone + Eq + Hash + fmt::Debug {
    type Move: Clone + Ord + fmt::Debug;
    type Player: Copy + Eq + fmt::Debug;

    /// Magnitude of a decided result: win `+U`, loss `-U`, draw `0`.
    const MAX_UTILITY: Score;

    fn player_to_move(&self) -> Self::Player;

    /// `Some` once the game is decided or drawn.
    fn outcome(&self) -> Option<Outcome<Self::Player>>;

    /// Legal moves for the player to move. Empty when the player must pass
    /// or the game is over.
    fn legal_moves(&self) -> Vec<Self::Move>;

    fn apply_move(&self, mv: &Self::Move) -> Result<Self>;

    /// Same position with the turn handed to the other player.
    #[must_use]
    fn pass(&self) -> Self;

    fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    fn terminal_utility(&self, perspective: Self::Player) -> Option<Score> {
        self.outcome().map(|outcome| match outcome {
            Outcome::Win(winner) if winner == perspective => Self::MAX_UTILITY,
            Outcome::Win(_) => -Self::MAX_UTILITY,
            Outcome::Draw => 0,
        })
    }
}

/// Static evaluation of a non-terminal position.
///
/// Scores are from `perspective`'s point of view and must lie strictly
/// inside `(-MAX_UTILITY, MAX_UTILITY)`.
pub trait Evaluator<G: GameState> {
    fn evaluate(&self, state: &G, perspective: G::Player) -> Score;
}

impl<G, F> Evaluator<G> for F
where
    G: GameState,
    F: Fn(&G, G::Player) -> Score,
{
    fn evaluate(&self, state: &G, perspective: G::Player) -> Score {
        self(state, perspective)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Deepest fully completed iteration.
    pub depth: u32,
    pub nodes: u64,
    pub cutoffs: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub time_ms: u64,
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome<M> {
    /// `None` only when the root itself is terminal.
    pub best_move: Option<Ply<M>>,
    pub score: Score,
    pub stats: SearchStats,
}

pub trait Searcher<G: GameState> {
    fn search(&mut self, root: &G, maximizing: G::Player) -> Result<SearchOutcome<G::Move>>;
}

/// Picks the move for `maximizing` from `root` with a fresh alpha-beta
/// engine. The deadline, if configured, starts counting now.
pub fn choose_move<G, E>(
    root: &G,
    maximizing: G::Player,
    config: &SearchConfig,
    evaluator: E,
) -> Result<Ply<G::Move>>
where
    G: GameState,
    E: Evaluator<G>,
{
    let mut engine = AlphaBetaEngine::new(Arc::new(config.clone()), evaluator)?;
    let outcome = engine.search(root, maximizing)?;
    outcome.best_move.ok_or(Error::NoMoveAvailable)
}
